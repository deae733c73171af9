//! Shared test utilities for the siteops test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! write(tmp.path(), "broken.html", r#"<a href="gone.html">x</a>"#);
//!
//! let mut sink = ReportSink::silent();
//! run_tests(tmp.path(), &SiteConfig::default(), &mut sink);
//! assert_eq!(messages_of(&sink, EntryKind::Fail), vec!["broken.html: Broken link - gone.html"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::report::{EntryKind, ReportSink};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Site tree helpers
// =========================================================================

/// Write `content` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
}

/// Read `root/rel` as text. Panics with the path on failure.
pub fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel))
        .unwrap_or_else(|e| panic!("cannot read {rel}: {e}"))
}

// =========================================================================
// Report lookups
// =========================================================================

/// Messages of every entry of `kind`, in recording order.
pub fn messages_of(sink: &ReportSink, kind: EntryKind) -> Vec<String> {
    sink.entries()
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| e.message.clone())
        .collect()
}
