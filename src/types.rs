//! Shared types passed between the collector, the tools, and the output layer.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file discovered by [`collect_files`](crate::collect::collect_files).
///
/// Immutable once produced; each tool consumes the list once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// The extension suffix the file was matched against (e.g. `.css`).
    pub extension: String,
}

impl FileEntry {
    /// Path relative to `root` for display, falling back to the full path.
    pub fn display_path(&self, root: &Path) -> String {
        display_relative(&self.path, root)
    }

    /// Whether the file is an already-minified artifact (`name.min.ext`).
    pub fn is_minified(&self) -> bool {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().contains(".min."))
            .unwrap_or(false)
    }
}

/// The three asset families the optimizer knows how to shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Html,
    Css,
    Js,
}

impl AssetKind {
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Html => ".html",
            AssetKind::Css => ".css",
            AssetKind::Js => ".js",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Html => "HTML",
            AssetKind::Css => "CSS",
            AssetKind::Js => "JS",
        }
    }
}

/// Byte accounting for one minified file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizationResult {
    pub file: String,
    pub kind: AssetKind,
    pub original_size: u64,
    pub new_size: u64,
    pub savings: u64,
}

impl OptimizationResult {
    pub fn new(file: String, kind: AssetKind, original_size: u64, new_size: u64) -> Self {
        Self {
            file,
            kind,
            original_size,
            new_size,
            savings: original_size.saturating_sub(new_size),
        }
    }
}

pub(crate) fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
