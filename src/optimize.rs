//! Asset minification.
//!
//! Collects the site's HTML (whole root), CSS (`optimize.css_dir`) and JS
//! (`optimize.js_dir`) files, minifies each one, and writes the result next to
//! the source with `.min` inserted before the extension:
//!
//! ```text
//! index.html            →  index.min.html
//! assets/css/main.css   →  assets/css/main.min.css
//! assets/js/main.js     →  assets/js/main.min.js
//! ```
//!
//! Already-minified files (`*.min.*`) are never inputs, and scripts whose path
//! contains a vendored-library fragment (`jquery`, `bootstrap`, ...) are left
//! alone.
//!
//! ## Failure policy
//!
//! A file that cannot be read, minified, or written becomes a
//! [`FileOutcome::Failed`] and the batch carries on. Only infrastructure
//! problems (the worker pool cannot start) abort the run.
//!
//! ## Size guarantee
//!
//! If a minifier ever produces more bytes than it was given, the source bytes
//! are written to the `.min` file unchanged, so a `.min` file is never larger
//! than its source and savings are never negative.
//!
//! ## Parallelism
//!
//! Files of one kind are minified on a rayon pool sized by
//! [`effective_threads`](crate::config::effective_threads). Results are
//! collected in input order before they are reported, so the console output
//! is the same as a sequential run.

use crate::collect::collect_files;
use crate::config::{self, SiteConfig};
use crate::minify::{MinifyError, Minifier, StandardMinifier};
use crate::types::{AssetKind, FileEntry, OptimizationResult};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Minify(#[from] MinifyError),
    #[error("could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Optimized(OptimizationResult),
    Failed {
        file: String,
        kind: AssetKind,
        error: String,
    },
}

impl FileOutcome {
    pub fn kind(&self) -> AssetKind {
        match self {
            FileOutcome::Optimized(r) => r.kind,
            FileOutcome::Failed { kind, .. } => *kind,
        }
    }
}

/// Progress events, emitted in input order.
#[derive(Debug, Clone)]
pub enum OptimizeEvent {
    KindStarted { kind: AssetKind, file_count: usize },
    FileFinished(FileOutcome),
}

/// Running totals across all kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeStats {
    pub html_files: usize,
    pub css_files: usize,
    pub js_files: usize,
    pub failures: usize,
    pub total_savings: u64,
}

impl OptimizeStats {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Optimized(result) => {
                match result.kind {
                    AssetKind::Html => self.html_files += 1,
                    AssetKind::Css => self.css_files += 1,
                    AssetKind::Js => self.js_files += 1,
                }
                self.total_savings += result.savings;
            }
            FileOutcome::Failed { .. } => self.failures += 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptimizeReport {
    pub outcomes: Vec<FileOutcome>,
    pub stats: OptimizeStats,
}

/// Minify the site under `root` with the production minifiers.
pub fn optimize(
    root: &Path,
    config: &SiteConfig,
    events: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeReport, OptimizeError> {
    optimize_with_minifier(&StandardMinifier, root, config, events)
}

/// Minify using a specific minifier (allows testing with a mock).
pub fn optimize_with_minifier(
    minifier: &impl Minifier,
    root: &Path,
    config: &SiteConfig,
    events: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeReport, OptimizeError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config::effective_threads(&config.processing))
        .build()?;

    let mut outcomes = Vec::new();
    let mut stats = OptimizeStats::default();

    for kind in [AssetKind::Html, AssetKind::Css, AssetKind::Js] {
        let targets = select_targets(root, config, kind);
        tracing::debug!("{} {} files to minify", targets.len(), kind.label());
        emit(
            &events,
            OptimizeEvent::KindStarted {
                kind,
                file_count: targets.len(),
            },
        );

        let batch: Vec<FileOutcome> = pool.install(|| {
            targets
                .par_iter()
                .map(|entry| optimize_file(minifier, root, entry, kind))
                .collect()
        });

        for outcome in batch {
            stats.record(&outcome);
            emit(&events, OptimizeEvent::FileFinished(outcome.clone()));
            outcomes.push(outcome);
        }
    }

    Ok(OptimizeReport { outcomes, stats })
}

fn emit(events: &Option<Sender<OptimizeEvent>>, event: OptimizeEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is printing.
        tx.send(event).ok();
    }
}

/// Files of `kind` that should be minified, in collection order.
pub fn select_targets(root: &Path, config: &SiteConfig, kind: AssetKind) -> Vec<FileEntry> {
    let dir = match kind {
        AssetKind::Html => root.to_path_buf(),
        AssetKind::Css => root.join(&config.optimize.css_dir),
        AssetKind::Js => root.join(&config.optimize.js_dir),
    };
    collect_files(&dir, kind.extension(), &config.collect.skip_dirs)
        .into_iter()
        .filter(|entry| !entry.is_minified())
        .filter(|entry| kind != AssetKind::Js || !is_vendored(entry, root, config))
        .collect()
}

fn is_vendored(entry: &FileEntry, root: &Path, config: &SiteConfig) -> bool {
    let rel = entry.display_path(root);
    config
        .optimize
        .js_denylist
        .iter()
        .any(|fragment| rel.contains(fragment.as_str()))
}

fn optimize_file(
    minifier: &impl Minifier,
    root: &Path,
    entry: &FileEntry,
    kind: AssetKind,
) -> FileOutcome {
    let file = entry.display_path(root);
    match minify_to_sibling(minifier, &entry.path, kind) {
        Ok((original_size, new_size)) => {
            FileOutcome::Optimized(OptimizationResult::new(file, kind, original_size, new_size))
        }
        Err(err) => {
            tracing::debug!("{file}: {err}");
            FileOutcome::Failed {
                file,
                kind,
                error: err.to_string(),
            }
        }
    }
}

/// Minify one file into its `.min` sibling; returns `(original, new)` sizes.
fn minify_to_sibling(
    minifier: &impl Minifier,
    path: &Path,
    kind: AssetKind,
) -> Result<(u64, u64), OptimizeError> {
    let content = std::fs::read_to_string(path)?;
    let minified = minifier.minify(kind, &content)?;

    let output = if minified.len() > content.len() {
        content.as_str()
    } else {
        minified.as_str()
    };
    std::fs::write(min_path(path), output)?;

    Ok((content.len() as u64, output.len() as u64))
}

/// `dir/name.ext` → `dir/name.min.ext`.
pub fn min_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.min.{}", ext.to_string_lossy()),
        None => format!("{stem}.min"),
    };
    path.with_file_name(name)
}
