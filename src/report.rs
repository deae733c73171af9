//! Accumulator for check outcomes.
//!
//! A [`ReportSink`] lives for one tool invocation. Each `pass`/`fail`/`warn`/
//! `error` call appends an entry, bumps the matching counter, and echoes the
//! line right away (unless the sink is silent), so long scans show progress.
//! Nothing here can fail.

use crate::output;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Pass,
    Fail,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub kind: EntryKind,
    pub message: String,
}

/// Totals per entry kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl Summary {
    /// Ready for production iff nothing failed and nothing errored.
    pub fn is_ready(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.warnings + self.errors
    }
}

#[derive(Debug)]
pub struct ReportSink {
    entries: Vec<ReportEntry>,
    summary: Summary,
    echo: bool,
}

impl ReportSink {
    /// A sink that prints every entry as it is recorded.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            summary: Summary::default(),
            echo: true,
        }
    }

    /// A sink that only records (tests, `--format json`).
    pub fn silent() -> Self {
        Self {
            echo: false,
            ..Self::new()
        }
    }

    pub fn section(&self, title: &str) {
        if self.echo {
            println!("{}", output::format_section(title));
        }
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        self.summary.passed += 1;
        self.record(EntryKind::Pass, message.into());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.summary.failed += 1;
        self.record(EntryKind::Fail, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.summary.warnings += 1;
        self.record(EntryKind::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.summary.errors += 1;
        self.record(EntryKind::Error, message.into());
    }

    /// Record `kind` through the matching counter.
    pub fn push(&mut self, kind: EntryKind, message: impl Into<String>) {
        match kind {
            EntryKind::Pass => self.pass(message),
            EntryKind::Fail => self.fail(message),
            EntryKind::Warn => self.warn(message),
            EntryKind::Error => self.error(message),
        }
    }

    fn record(&mut self, kind: EntryKind, message: String) {
        let entry = ReportEntry { kind, message };
        if self.echo {
            println!("{}", output::format_entry(&entry));
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Print totals and the verdict, and return the totals.
    pub fn summarize(&self) -> Summary {
        if self.echo {
            for line in output::format_summary(&self.summary) {
                println!("{line}");
            }
        }
        self.summary
    }

    pub fn into_report(self, tool: &'static str) -> Report {
        Report {
            tool,
            summary: self.summary,
            ready: self.summary.is_ready(),
            entries: self.entries,
        }
    }
}

impl Default for ReportSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable form of a finished run, used for `--format json`.
#[derive(Debug, Serialize)]
pub struct Report {
    pub tool: &'static str,
    pub summary: Summary,
    pub ready: bool,
    pub entries: Vec<ReportEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_entries() {
        let mut sink = ReportSink::silent();
        sink.pass("a");
        sink.pass("b");
        sink.warn("c");
        sink.fail("d");
        sink.error("e");

        let summary = sink.summarize();
        assert_eq!(
            summary,
            Summary {
                passed: 2,
                failed: 1,
                warnings: 1,
                errors: 1
            }
        );
        assert_eq!(summary.total(), sink.entries().len());
        assert_eq!(sink.entries()[3].kind, EntryKind::Fail);
        assert_eq!(sink.entries()[3].message, "d");
    }

    #[test]
    fn ready_only_without_failures_or_errors() {
        let mut sink = ReportSink::silent();
        sink.pass("ok");
        sink.warn("meh");
        assert!(sink.summary().is_ready());

        sink.error("io");
        assert!(!sink.summary().is_ready());

        let mut sink = ReportSink::silent();
        sink.fail("broken");
        assert!(!sink.summary().is_ready());
    }

    #[test]
    fn empty_sink_is_ready() {
        assert!(ReportSink::silent().summarize().is_ready());
    }

    #[test]
    fn push_routes_to_counter() {
        let mut sink = ReportSink::silent();
        sink.push(EntryKind::Warn, "w");
        sink.push(EntryKind::Error, "e");
        assert_eq!(sink.summary().warnings, 1);
        assert_eq!(sink.summary().errors, 1);
    }

    #[test]
    fn report_serializes_lowercase_kinds() {
        let mut sink = ReportSink::silent();
        sink.fail("index.html: Missing title");
        let json = serde_json::to_value(sink.into_report("validate")).unwrap();
        assert_eq!(json["tool"], "validate");
        assert_eq!(json["ready"], false);
        assert_eq!(json["entries"][0]["kind"], "fail");
        assert_eq!(json["summary"]["failed"], 1);
    }
}
