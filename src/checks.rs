//! Building blocks shared by `validate` and `test`.

use crate::collect::collect_files;
use crate::config::CollectConfig;
use crate::markup::Page;
use crate::report::{EntryKind, ReportSink};
use std::path::Path;

/// An HTML page loaded for checking. `page` is `Err` with the I/O message
/// when the file could not be read.
pub struct LoadedPage {
    pub name: String,
    /// Listed in `collect.partials`: a fragment, not a full document.
    pub is_partial: bool,
    pub page: Result<Page, String>,
}

/// Parse every HTML page under `root`, skipping `.min.html` artifacts.
///
/// Bytes that are not valid UTF-8 are replaced, not rejected, so a page in a
/// legacy encoding is still checked. Read failures are kept per page so each
/// check section can report them.
pub fn load_pages(root: &Path, collect: &CollectConfig) -> Vec<LoadedPage> {
    collect_files(root, ".html", &collect.skip_dirs)
        .into_iter()
        .filter(|entry| !entry.is_minified())
        .map(|entry| {
            let name = entry.display_path(root);
            LoadedPage {
                is_partial: collect.partials.iter().any(|p| *p == name),
                page: std::fs::read(&entry.path)
                    .map(|bytes| Page::parse(String::from_utf8_lossy(&bytes).into_owned()))
                    .map_err(|e| e.to_string()),
                name,
            }
        })
        .collect()
}

/// A named presence test over a parsed page.
pub struct PageCheck {
    pub label: &'static str,
    pub test: fn(&Page) -> bool,
}

/// Run `checks` against one page; a missing feature is recorded as `on_missing`.
///
/// Every check runs regardless of earlier outcomes.
pub fn run_page_checks(
    sink: &mut ReportSink,
    name: &str,
    page: &Page,
    checks: &[PageCheck],
    on_missing: EntryKind,
) {
    for check in checks {
        if (check.test)(page) {
            sink.pass(format!("{name}: {} present", check.label));
        } else if on_missing == EntryKind::Warn {
            sink.warn(format!("{name}: Consider adding {}", check.label));
        } else {
            sink.push(on_missing, format!("{name}: Missing {}", check.label));
        }
    }
}

/// Record one entry per listed file: pass when it exists under `root`,
/// `on_missing` otherwise.
pub fn check_files_exist(
    sink: &mut ReportSink,
    root: &Path,
    files: &[String],
    category: &str,
    on_missing: EntryKind,
) {
    for file in files {
        if root.join(file).exists() {
            sink.pass(format!("{category} exists: {file}"));
        } else {
            sink.push(on_missing, format!("Missing {} file: {file}", category.to_lowercase()));
        }
    }
}

/// Read a text file if it exists. `Ok(None)` when absent.
pub fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write;
    use tempfile::TempDir;

    const CHECKS: &[PageCheck] = &[
        PageCheck {
            label: "Title tag",
            test: Page::has_title,
        },
        PageCheck {
            label: "H1 tag",
            test: Page::has_h1,
        },
    ];

    #[test]
    fn page_checks_do_not_short_circuit() {
        let mut sink = ReportSink::silent();
        let page = Page::parse("<html><body><h1>x</h1></body></html>");
        run_page_checks(&mut sink, "index.html", &page, CHECKS, EntryKind::Fail);

        let messages: Vec<&str> = sink.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["index.html: Missing Title tag", "index.html: H1 tag present"]
        );
        assert_eq!(sink.summary().failed, 1);
        assert_eq!(sink.summary().passed, 1);
    }

    #[test]
    fn warn_checks_suggest() {
        let mut sink = ReportSink::silent();
        run_page_checks(&mut sink, "a.html", &Page::parse(""), CHECKS, EntryKind::Warn);
        assert_eq!(sink.entries()[0].message, "a.html: Consider adding Title tag");
        assert_eq!(sink.summary().warnings, 2);
    }

    #[test]
    fn file_existence() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "robots.txt", "User-agent: *");
        let mut sink = ReportSink::silent();
        let files = vec!["robots.txt".to_string(), "sitemap.xml".to_string()];
        check_files_exist(&mut sink, tmp.path(), &files, "SEO", EntryKind::Warn);

        assert_eq!(sink.entries()[0].message, "SEO exists: robots.txt");
        assert_eq!(sink.entries()[1].message, "Missing seo file: sitemap.xml");
        assert_eq!(sink.entries()[1].kind, EntryKind::Warn);
    }

    #[test]
    fn load_pages_skips_minified_and_marks_partials() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "index.html", "<title>x</title>");
        write(tmp.path(), "index.min.html", "<title>x</title>");
        write(tmp.path(), "header.html", "<nav></nav>");
        std::fs::write(tmp.path().join("cafe.html"), b"<h1>Caf\xe9</h1>").unwrap();

        let pages = load_pages(tmp.path(), &CollectConfig::default());
        let names: Vec<&str> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["cafe.html", "header.html", "index.html"]);
        assert!(pages[0].page.as_ref().is_ok_and(|p| p.has_h1()));
        assert!(pages[1].is_partial);
        assert!(!pages[2].is_partial);
        assert!(pages[2].page.as_ref().is_ok_and(|p| p.has_title()));
    }

    #[test]
    fn read_optional_absent_and_present() {
        let tmp = TempDir::new().unwrap();
        assert!(read_optional(&tmp.path().join("nope")).unwrap().is_none());
        write(tmp.path(), "robots.txt", "User-agent: *");
        assert_eq!(
            read_optional(&tmp.path().join("robots.txt")).unwrap().as_deref(),
            Some("User-agent: *")
        );
    }
}
