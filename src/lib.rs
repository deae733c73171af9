//! # siteops
//!
//! Build, audit and preview tooling for a static marketing site: flat HTML
//! pages at the root, stylesheets under `assets/css`, scripts under
//! `assets/js`, plus the usual deploy files (`sitemap.xml`, `robots.txt`,
//! `manifest.json`, `.htaccess`, `sw.js`).
//!
//! # Subcommands
//!
//! ```text
//! siteops optimize     write .min.html / .min.css / .min.js next to each source
//! siteops validate     structure, asset, SEO and accessibility checks
//! siteops test         pre-deploy smoke tests (links, images, headers)
//! siteops serve        local static server with ETags and error pages
//! siteops gen-config   print a documented siteops.toml
//! ```
//!
//! `validate` and `test` record every outcome into a [`report::ReportSink`]
//! and finish with a verdict: the site is ready for production when no check
//! failed and none errored. Warnings are advice.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`collect`] | Deterministic recursive file enumeration, skipping hidden and dependency directories |
//! | [`report`] | Pass / fail / warn / error accumulator and verdict |
//! | [`markup`] | HTML5 parsing and the element/attribute queries checks are built from |
//! | [`checks`] | Page loading and check runners shared by `validate` and `test` |
//! | [`validate`] | The `validate` subcommand |
//! | [`smoke`] | The `test` subcommand |
//! | [`minify`] | HTML, CSS and JS minifiers behind the [`minify::Minifier`] trait |
//! | [`optimize`] | Parallel minification of the whole site |
//! | [`serve`] | Static file server |
//! | [`config`] | `siteops.toml` loading, merging and validation |
//! | [`types`] | Shared data types (`FileEntry`, `AssetKind`, `OptimizationResult`) |
//! | [`output`] | Console formatting for every subcommand |
//!
//! # Design Decisions
//!
//! ## Parse, Don't Grep
//!
//! Pages are parsed with an HTML5 parser and queried with CSS selectors, so
//! attribute order, quoting style and case do not change a check's outcome.
//!
//! ## Checks Never Short-Circuit
//!
//! Every check runs whatever earlier checks reported, and nothing found in a
//! scan aborts it. Read failures are recorded as errors against the file and
//! the run carries on, so one report shows everything that needs fixing.
//!
//! ## Output Never Grows
//!
//! A `.min` file is never larger than its source; if a minifier would make a
//! file bigger, the source bytes are written instead.

pub mod checks;
pub mod collect;
pub mod config;
pub mod markup;
pub mod minify;
pub mod optimize;
pub mod output;
pub mod report;
pub mod serve;
pub mod smoke;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
