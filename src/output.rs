//! Console output formatting for every subcommand.
//!
//! Each report has a `format_*` function returning `Vec<String>` (or a single
//! `String`) and, where a whole block is printed at once, a `print_*` wrapper
//! that writes to stdout. Format functions are pure, so the exact console text
//! is covered by unit tests.
//!
//! # Output Format
//!
//! ## validate / test
//!
//! ```text
//! Testing link integrity...
//!   ✅ index.html: Link valid - about.html
//!   ❌ index.html: Broken link - careers.html
//!   ⚠️  about.html: Consider more lazy loading (50.0%)
//!
//! Results:
//! =================
//! ✅ Passed: 41
//! ❌ Failed: 1
//! ⚠️  Warnings: 1
//! 🚨 Errors: 0
//! =================
//! 🔧 Please address failed checks before deployment.
//! ```
//!
//! ## optimize
//!
//! ```text
//! Optimizing HTML files...
//!   ✓ index.html: 1.2 KB saved
//!   ✗ broken.html: Error - unexpected end of input
//!
//! Optimization Report:
//! ========================
//! HTML files optimized: 1
//! ...
//! Total space saved: 1.2 KB
//! ========================
//! ```

use crate::optimize::{FileOutcome, OptimizeEvent, OptimizeStats};
use crate::report::{EntryKind, ReportEntry, Summary};
use std::io::Write;
use std::path::Path;

const RULE: &str = "=================";

// ============================================================================
// Shared helpers
// ============================================================================

fn glyph(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Pass => "✅",
        EntryKind::Fail => "❌",
        // The warning sign renders narrow in most terminals; pad it.
        EntryKind::Warn => "⚠️ ",
        EntryKind::Error => "🚨",
    }
}

/// Human-readable byte count: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`.
///
/// Two decimals at most, trailing zeros dropped. MB is the largest unit.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["Bytes", "KB", "MB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Percentage with one decimal, as shown in coverage messages.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

// ============================================================================
// Check reports (validate, test)
// ============================================================================

pub fn format_section(title: &str) -> String {
    format!("\n{title}")
}

pub fn format_entry(entry: &ReportEntry) -> String {
    format!("  {} {}", glyph(entry.kind), entry.message)
}

/// Totals block and the production verdict.
pub fn format_summary(summary: &Summary) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "Results:".to_string(),
        RULE.to_string(),
        format!("{} Passed: {}", glyph(EntryKind::Pass), summary.passed),
        format!("{} Failed: {}", glyph(EntryKind::Fail), summary.failed),
        format!("{} Warnings: {}", glyph(EntryKind::Warn), summary.warnings),
        format!("{} Errors: {}", glyph(EntryKind::Error), summary.errors),
        RULE.to_string(),
    ];
    if summary.is_ready() {
        lines.push("🎉 All critical checks passed! Website is ready for production.".to_string());
    } else {
        lines.push("🔧 Please address failed checks before deployment.".to_string());
    }
    lines
}

// ============================================================================
// Optimizer
// ============================================================================

pub fn format_outcome(outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Optimized(result) => {
            format!("  ✓ {}: {} saved", result.file, format_bytes(result.savings))
        }
        FileOutcome::Failed { file, error, .. } => format!("  ✗ {file}: Error - {error}"),
    }
}

/// Lines for one progress event: a heading per asset kind, one line per file.
pub fn format_optimize_event(event: &OptimizeEvent) -> Vec<String> {
    match event {
        OptimizeEvent::KindStarted { kind, file_count } => {
            let mut lines = vec![format_section(&format!("Optimizing {} files...", kind.label()))];
            if *file_count == 0 {
                lines.push(format!("  No {} files found", kind.label()));
            }
            lines
        }
        OptimizeEvent::FileFinished(outcome) => vec![format_outcome(outcome)],
    }
}

pub fn format_optimize_report(stats: &OptimizeStats) -> Vec<String> {
    let rule = "========================";
    let mut lines = vec![
        String::new(),
        "Optimization Report:".to_string(),
        rule.to_string(),
        format!("HTML files optimized: {}", stats.html_files),
        format!("CSS files optimized: {}", stats.css_files),
        format!("JS files optimized: {}", stats.js_files),
    ];
    if stats.failures > 0 {
        lines.push(format!("Files failed: {}", stats.failures));
    }
    lines.push(format!(
        "Total space saved: {}",
        format_bytes(stats.total_savings)
    ));
    lines.push(rule.to_string());
    lines
}

pub fn print_optimize_report(stats: &OptimizeStats) {
    for line in format_optimize_report(stats) {
        println!("{}", line);
    }
}

// ============================================================================
// Server
// ============================================================================

pub fn format_serve_banner(url: &str, root: &Path) -> Vec<String> {
    vec![
        format!("🚀 Server running on {url}"),
        format!("📁 Serving files from: {}", root.display()),
    ]
}

/// Print the banner in one write. A closed stdout must not take the server
/// down, so write errors are ignored.
pub fn print_serve_banner(url: &str, root: &Path) {
    let banner = format_serve_banner(url, root).join("\n");
    let mut out = std::io::stdout().lock();
    writeln!(out, "{banner}").ok();
    out.flush().ok();
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetKind, OptimizationResult};

    #[test]
    fn format_bytes_zero() {
        assert_eq!(format_bytes(0), "0 Bytes");
    }

    #[test]
    fn format_bytes_small() {
        assert_eq!(format_bytes(100), "100 Bytes");
    }

    #[test]
    fn format_bytes_exact_kilobyte() {
        assert_eq!(format_bytes(1024), "1 KB");
    }

    #[test]
    fn format_bytes_fractional() {
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1300), "1.27 KB");
    }

    #[test]
    fn format_bytes_caps_at_megabytes() {
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5120 MB");
    }

    #[test]
    fn format_percentage_one_decimal() {
        assert_eq!(format_percentage(90.0), "90.0%");
        assert_eq!(format_percentage(66.666), "66.7%");
    }

    #[test]
    fn entry_lines_carry_glyphs() {
        let entry = |kind| ReportEntry {
            kind,
            message: "index.html: Title tag present".to_string(),
        };
        assert_eq!(
            format_entry(&entry(EntryKind::Pass)),
            "  ✅ index.html: Title tag present"
        );
        assert!(format_entry(&entry(EntryKind::Fail)).starts_with("  ❌ "));
        assert!(format_entry(&entry(EntryKind::Warn)).starts_with("  ⚠️  "));
        assert!(format_entry(&entry(EntryKind::Error)).starts_with("  🚨 "));
    }

    #[test]
    fn summary_verdict_ready() {
        let lines = format_summary(&Summary {
            passed: 3,
            warnings: 2,
            ..Default::default()
        });
        assert!(lines.contains(&"✅ Passed: 3".to_string()));
        assert!(lines.last().unwrap().contains("ready for production"));
    }

    #[test]
    fn summary_verdict_advisory() {
        let lines = format_summary(&Summary {
            passed: 3,
            failed: 1,
            ..Default::default()
        });
        assert!(lines.contains(&"❌ Failed: 1".to_string()));
        assert!(lines.last().unwrap().contains("Please address"));
    }

    #[test]
    fn outcome_lines() {
        let ok = FileOutcome::Optimized(OptimizationResult::new(
            "assets/css/main.css".into(),
            AssetKind::Css,
            4096,
            2048,
        ));
        assert_eq!(format_outcome(&ok), "  ✓ assets/css/main.css: 2 KB saved");

        let failed = FileOutcome::Failed {
            file: "assets/js/app.js".into(),
            kind: AssetKind::Js,
            error: "unexpected token".into(),
        };
        assert_eq!(
            format_outcome(&failed),
            "  ✗ assets/js/app.js: Error - unexpected token"
        );
    }

    #[test]
    fn optimize_events() {
        let started = OptimizeEvent::KindStarted {
            kind: AssetKind::Css,
            file_count: 2,
        };
        assert_eq!(format_optimize_event(&started), vec!["\nOptimizing CSS files..."]);

        let empty = OptimizeEvent::KindStarted {
            kind: AssetKind::Js,
            file_count: 0,
        };
        assert_eq!(
            format_optimize_event(&empty),
            vec!["\nOptimizing JS files...", "  No JS files found"]
        );

        let finished = OptimizeEvent::FileFinished(FileOutcome::Optimized(OptimizationResult::new(
            "assets/css/main.css".to_string(),
            AssetKind::Css,
            2048,
            1024,
        )));
        assert_eq!(
            format_optimize_event(&finished),
            vec!["  ✓ assets/css/main.css: 1 KB saved"]
        );
    }

    #[test]
    fn optimize_report_lists_failures_only_when_present() {
        let stats = OptimizeStats {
            html_files: 2,
            css_files: 1,
            js_files: 0,
            failures: 0,
            total_savings: 2048,
        };
        let lines = format_optimize_report(&stats);
        assert!(lines.contains(&"HTML files optimized: 2".to_string()));
        assert!(lines.contains(&"Total space saved: 2 KB".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Files failed")));

        let lines = format_optimize_report(&OptimizeStats {
            failures: 3,
            ..stats
        });
        assert!(lines.contains(&"Files failed: 3".to_string()));
    }

    #[test]
    fn serve_banner() {
        let lines = format_serve_banner("http://127.0.0.1:3000", Path::new("/srv/site"));
        assert_eq!(lines[0], "🚀 Server running on http://127.0.0.1:3000");
        assert_eq!(lines[1], "📁 Serving files from: /srv/site");
    }
}
