//! Recursive file discovery shared by every tool.
//!
//! The walk is depth-first pre-order with entries sorted by file name, so the
//! same tree always yields the same list. Hidden directories (name starting
//! with `.`) and dependency directories (`node_modules` by default) are
//! pruned. The root itself is never pruned, so `collect_files(".", ..)` works.
//! Symlinked files and directories are followed; link cycles are reported by
//! the walker and skipped.
//!
//! Collection is best effort: a directory that cannot be read is skipped and
//! whatever was found elsewhere is still returned.

use crate::types::FileEntry;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Collect every file under `root` whose name ends with `extension`.
///
/// `extension` is a plain suffix (`".html"`), so `main.min.css` matches
/// `".css"`. Callers filter minified artifacts themselves.
pub fn collect_files(root: &Path, extension: &str, skip_dirs: &[String]) -> Vec<FileEntry> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_pruned_dir(e, skip_dirs))
        .filter_map(|res| match res {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(extension))
        .map(|e| FileEntry {
            path: e.into_path(),
            extension: extension.to_string(),
        })
        .collect()
}

fn is_pruned_dir(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || skip_dirs.iter().any(|d| d.as_str() == name)
}
