//! Minification backends.
//!
//! The [`Minifier`] trait is the seam between the optimizer's batch logic and
//! the actual text transforms, so the batch logic can be tested with a mock.
//! The production implementation is [`StandardMinifier`]:
//!
//! | Kind | Crate          | Configuration                                         |
//! |------|----------------|-------------------------------------------------------|
//! | HTML | `minify-html`  | inline CSS/JS minified, comments dropped, closing tags and `<html>`/`<head>` kept |
//! | CSS  | `lightningcss` | parse, structural minify, minified printer            |
//! | JS   | `minify-js`    | global top-level mode                                 |
//!
//! All three are deterministic: the same input always produces the same bytes.

use crate::types::AssetKind;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MinifyError {
    #[error("input is not valid UTF-8")]
    Encoding,
    #[error("{0}")]
    Css(String),
    #[error("{0}")]
    Js(String),
}

/// A text minifier for the three asset kinds.
pub trait Minifier: Sync {
    fn minify(&self, kind: AssetKind, source: &str) -> Result<String, MinifyError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StandardMinifier;

impl Minifier for StandardMinifier {
    fn minify(&self, kind: AssetKind, source: &str) -> Result<String, MinifyError> {
        match kind {
            AssetKind::Html => minify_html_document(source),
            AssetKind::Css => minify_css(source),
            AssetKind::Js => minify_js_source(source),
        }
    }
}

fn minify_html_document(source: &str) -> Result<String, MinifyError> {
    let mut cfg = minify_html::Cfg::new();
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.keep_comments = false;
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    let out = minify_html::minify(source.as_bytes(), &cfg);
    String::from_utf8(out).map_err(|_| MinifyError::Encoding)
}

fn minify_css(source: &str) -> Result<String, MinifyError> {
    let mut sheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    Ok(printed.code)
}

fn minify_js_source(source: &str) -> Result<String, MinifyError> {
    let session = minify_js::Session::new();
    let mut out = Vec::with_capacity(source.len());
    minify_js::minify(
        &session,
        minify_js::TopLevelMode::Global,
        source.as_bytes(),
        &mut out,
    )
    .map_err(|e| MinifyError::Js(format!("{e:?}")))?;
    String::from_utf8(out).map_err(|_| MinifyError::Encoding)
}
