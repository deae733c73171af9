//! `siteops test`: pre-deploy smoke tests.
//!
//! Sections, in order:
//!
//! 1. **File structure**: every `smoke.required_files` entry exists (fail).
//! 2. **HTML validity**: `<!DOCTYPE html>`, an explicit `<html>…</html>`
//!    pair, `<meta charset>` (fail). Partials are skipped.
//! 3. **Link integrity**: each internal `.html` link resolves on disk (fail).
//! 4. **Image optimization**: lazy-loading and alt coverage must be strictly
//!    above `smoke.lazy_threshold` / `smoke.alt_threshold` (warn). Pages
//!    without images are not scored.
//! 5. **SEO compliance**: `sitemap.xml` has a `<urlset`, `robots.txt` has a
//!    `User-agent:` line (fail, only when the files exist).
//! 6. **Security**: `.htaccess` sets the expected headers and HTTPS redirect
//!    (warn, only when the file exists).
//! 7. **Performance**: service worker and performance script present (warn).
//! 8. **Accessibility**: `aria-*` and `role` attributes present (warn).

use crate::checks::{LoadedPage, PageCheck, load_pages, read_optional, run_page_checks};
use crate::config::{SiteConfig, SmokeConfig};
use crate::markup::Page;
use crate::output::format_percentage;
use crate::report::{EntryKind, ReportSink};
use crate::serve::percent_decode;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

fn regex(pattern: &'static str) -> Regex {
    // Only ever called with the literal patterns below.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

static HTACCESS_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (regex(r"(?i)Header.*X-XSS-Protection"), "XSS Protection header"),
        (
            regex(r"(?i)Header.*X-Content-Type-Options"),
            "Content-Type-Options header",
        ),
        (regex(r"(?i)Header.*X-Frame-Options"), "Frame-Options header"),
        (regex(r"(?i)RewriteRule.*https"), "HTTPS redirect"),
    ]
});

const PERFORMANCE_FILES: &[(&str, &str)] = &[
    ("assets/js/performance.js", "Optimization script"),
    ("sw.js", "Service worker"),
];

const ACCESSIBILITY_CHECKS: &[PageCheck] = &[
    PageCheck {
        label: "ARIA attributes",
        test: Page::has_aria_attribute,
    },
    PageCheck {
        label: "role attributes",
        test: Page::has_role_attribute,
    },
];

/// Run every smoke test section against the site under `root`.
pub fn run_tests(root: &Path, config: &SiteConfig, sink: &mut ReportSink) {
    let pages = load_pages(root, &config.collect);
    tracing::debug!("testing {} pages under {}", pages.len(), root.display());

    test_file_structure(root, &config.smoke.required_files, sink);
    test_html_validity(&pages, sink);
    test_link_integrity(root, &pages, sink);
    test_image_optimization(&pages, &config.smoke, sink);
    test_seo_compliance(root, sink);
    test_security_measures(root, sink);
    test_performance(root, sink);
    test_accessibility(&pages, sink);
}

fn test_file_structure(root: &Path, required: &[String], sink: &mut ReportSink) {
    sink.section("📁 Testing file structure...");
    for file in required {
        if root.join(file).exists() {
            sink.pass(format!("File exists: {file}"));
        } else {
            sink.fail(format!("Missing required file: {file}"));
        }
    }
}

fn test_html_validity(pages: &[LoadedPage], sink: &mut ReportSink) {
    sink.section("📝 Testing HTML validity...");
    for loaded in pages.iter().filter(|p| !p.is_partial) {
        let name = &loaded.name;
        let page = match &loaded.page {
            Ok(page) => page,
            Err(e) => {
                sink.fail(format!("{name}: Cannot read file - {e}"));
                continue;
            }
        };

        if page.has_html5_doctype() {
            sink.pass(format!("{name}: Valid DOCTYPE"));
        } else {
            sink.fail(format!("{name}: Missing or invalid DOCTYPE"));
        }

        if page.has_explicit_html_element() {
            sink.pass(format!("{name}: Valid HTML structure"));
        } else {
            sink.fail(format!("{name}: Invalid HTML structure"));
        }

        if page.has_charset_meta() {
            sink.pass(format!("{name}: Charset meta tag present"));
        } else {
            sink.fail(format!("{name}: Missing charset meta tag"));
        }
    }
}

/// Where an `href` points, as far as the link check is concerned.
#[derive(Debug, PartialEq, Eq)]
pub enum LinkTarget {
    /// Not an HTML document, external, or a same-page fragment: not checked.
    Skipped,
    /// A local HTML document to look for on disk.
    Local(PathBuf),
}

/// Classify `href` found in the page at `page_name` (relative to `root`).
///
/// Only hrefs mentioning `.html` are considered. Absolute URLs (any scheme,
/// or protocol-relative `//host`), `mailto:`/`tel:` and `#fragment` links are
/// skipped. Query strings and fragments are dropped and `%XX` escapes decoded
/// before resolving, the same way `serve` maps request paths. A leading `/`
/// resolves from the site root; anything else resolves from the linking
/// page's directory.
pub fn classify_link(root: &Path, page_name: &str, href: &str) -> LinkTarget {
    if !href.contains(".html")
        || href.starts_with('#')
        || href.starts_with("//")
        || href.starts_with("http")
        || has_scheme(href)
    {
        return LinkTarget::Skipped;
    }
    let path_part = href.split(['#', '?']).next().unwrap_or_default();
    if path_part.is_empty() {
        return LinkTarget::Skipped;
    }
    let decoded = percent_decode(path_part).unwrap_or_else(|| path_part.to_string());
    let resolved = match decoded.strip_prefix('/') {
        Some(abs) => root.join(abs),
        None => {
            let page_dir = Path::new(page_name).parent().unwrap_or(Path::new(""));
            root.join(page_dir).join(&decoded)
        }
    };
    LinkTarget::Local(resolved)
}

fn has_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn test_link_integrity(root: &Path, pages: &[LoadedPage], sink: &mut ReportSink) {
    sink.section("🔗 Testing link integrity...");
    for loaded in pages {
        let name = &loaded.name;
        let page = match &loaded.page {
            Ok(page) => page,
            Err(e) => {
                sink.fail(format!("{name}: Cannot test links - {e}"));
                continue;
            }
        };
        for href in page.hrefs() {
            if let LinkTarget::Local(target) = classify_link(root, name, &href) {
                if target.is_file() {
                    sink.pass(format!("{name}: Link valid - {href}"));
                } else {
                    sink.fail(format!("{name}: Broken link - {href}"));
                }
            }
        }
    }
}

fn test_image_optimization(pages: &[LoadedPage], smoke: &SmokeConfig, sink: &mut ReportSink) {
    sink.section("🖼️  Testing image optimization...");
    for loaded in pages {
        let name = &loaded.name;
        let page = match &loaded.page {
            Ok(page) => page,
            Err(e) => {
                sink.fail(format!("{name}: Cannot test images - {e}"));
                continue;
            }
        };
        let coverage = page.image_coverage();
        if let Some(lazy) = coverage.lazy_percentage() {
            let pct = format_percentage(lazy);
            if lazy > smoke.lazy_threshold {
                sink.pass(format!("{name}: Good lazy loading coverage ({pct})"));
            } else {
                sink.warn(format!("{name}: Consider more lazy loading ({pct})"));
            }
        }
        if let Some(alt) = coverage.alt_percentage() {
            let pct = format_percentage(alt);
            if alt > smoke.alt_threshold {
                sink.pass(format!("{name}: Good alt text coverage ({pct})"));
            } else {
                sink.warn(format!("{name}: Consider adding more alt text ({pct})"));
            }
        }
    }
}

fn test_seo_compliance(root: &Path, sink: &mut ReportSink) {
    sink.section("🔍 Testing SEO compliance...");
    check_text_file(root, "sitemap.xml", "Sitemap", sink, |content| {
        if content.contains("<urlset") {
            (EntryKind::Pass, "Valid XML structure")
        } else {
            (EntryKind::Fail, "Invalid XML structure")
        }
    });
    check_text_file(root, "robots.txt", "Robots.txt", sink, |content| {
        if content.contains("User-agent:") {
            (EntryKind::Pass, "Valid format")
        } else {
            (EntryKind::Fail, "Invalid format")
        }
    });
}

/// Judge an optional text file; absent files are not reported.
fn check_text_file(
    root: &Path,
    file: &str,
    label: &str,
    sink: &mut ReportSink,
    judge: impl Fn(&str) -> (EntryKind, &'static str),
) {
    match read_optional(&root.join(file)) {
        Ok(Some(content)) => {
            let (kind, verdict) = judge(&content);
            sink.push(kind, format!("{label}: {verdict}"));
        }
        Ok(None) => {}
        Err(e) => sink.error(format!("{label}: Cannot read {file} - {e}")),
    }
}

fn test_security_measures(root: &Path, sink: &mut ReportSink) {
    sink.section("🔒 Testing security measures...");
    match read_optional(&root.join(".htaccess")) {
        Ok(Some(htaccess)) => {
            for (pattern, label) in HTACCESS_RULES.iter() {
                if pattern.is_match(&htaccess) {
                    sink.pass(format!("Security: {label} configured"));
                } else {
                    sink.warn(format!("Security: Consider adding {label}"));
                }
            }
        }
        Ok(None) => {}
        Err(e) => sink.error(format!("Security: Cannot read .htaccess - {e}")),
    }
}

fn test_performance(root: &Path, sink: &mut ReportSink) {
    sink.section("⚡ Testing performance optimizations...");
    for (file, label) in PERFORMANCE_FILES {
        if root.join(file).exists() {
            sink.pass(format!("Performance: {label} present"));
        } else {
            sink.warn(format!("Performance: Consider adding {}", label.to_lowercase()));
        }
    }
}

fn test_accessibility(pages: &[LoadedPage], sink: &mut ReportSink) {
    sink.section("♿ Testing accessibility...");
    for loaded in pages {
        match &loaded.page {
            Ok(page) => {
                run_page_checks(sink, &loaded.name, page, ACCESSIBILITY_CHECKS, EntryKind::Warn)
            }
            Err(e) => sink.fail(format!("{}: Cannot test accessibility - {e}", loaded.name)),
        }
    }
}
