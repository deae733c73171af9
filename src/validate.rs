//! `siteops validate`: structure, asset, SEO, security, performance and
//! accessibility checks.
//!
//! | Section        | Check                                   | Missing ⇒ |
//! |----------------|-----------------------------------------|-----------|
//! | HTML structure | title, meta description, viewport, `lang`, `h1` | fail |
//! | Assets         | `validate.critical_assets` exist (images must decode) | fail / error |
//! | SEO            | `validate.seo_files` exist              | warn      |
//! | Security       | `validate.security_files` exist         | warn      |
//! | Performance    | `validate.performance_files` exist      | warn      |
//! | Accessibility  | `alt`, `aria-*`, `role` attributes      | warn      |
//!
//! Partials (`collect.partials`, e.g. `header.html`) are fragments, so the
//! document-level structure checks skip them. Unreadable pages are recorded
//! as errors. No check depends on another.

use crate::checks::{LoadedPage, PageCheck, check_files_exist, load_pages, run_page_checks};
use crate::config::SiteConfig;
use crate::markup::Page;
use crate::report::{EntryKind, ReportSink};
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "tif", "tiff"];

pub const STRUCTURE_CHECKS: &[PageCheck] = &[
    PageCheck {
        label: "Title tag",
        test: Page::has_title,
    },
    PageCheck {
        label: "Meta description",
        test: Page::has_meta_description,
    },
    PageCheck {
        label: "Viewport meta tag",
        test: Page::has_viewport_meta,
    },
    PageCheck {
        label: "Language attribute",
        test: Page::has_lang_attribute,
    },
    PageCheck {
        label: "H1 tag",
        test: Page::has_h1,
    },
];

pub const ACCESSIBILITY_CHECKS: &[PageCheck] = &[
    PageCheck {
        label: "alt attributes",
        test: Page::has_alt_attribute,
    },
    PageCheck {
        label: "ARIA attributes",
        test: Page::has_aria_attribute,
    },
    PageCheck {
        label: "role attributes",
        test: Page::has_role_attribute,
    },
];

/// Run every validation section against the site under `root`.
pub fn validate(root: &Path, config: &SiteConfig, sink: &mut ReportSink) {
    let pages = load_pages(root, &config.collect);
    tracing::debug!("validating {} pages under {}", pages.len(), root.display());

    validate_html_structure(&pages, sink);
    validate_assets(root, &config.validate.critical_assets, sink);

    sink.section("🔍 Validating SEO elements...");
    check_files_exist(sink, root, &config.validate.seo_files, "SEO", EntryKind::Warn);

    sink.section("🔒 Validating security measures...");
    check_files_exist(
        sink,
        root,
        &config.validate.security_files,
        "Security",
        EntryKind::Warn,
    );

    sink.section("⚡ Validating performance optimizations...");
    check_files_exist(
        sink,
        root,
        &config.validate.performance_files,
        "Performance",
        EntryKind::Warn,
    );

    validate_accessibility(&pages, sink);
}

fn validate_html_structure(pages: &[LoadedPage], sink: &mut ReportSink) {
    sink.section("📄 Validating HTML structure...");
    for loaded in pages.iter().filter(|p| !p.is_partial) {
        match &loaded.page {
            Ok(page) => run_page_checks(sink, &loaded.name, page, STRUCTURE_CHECKS, EntryKind::Fail),
            Err(e) => sink.error(format!("{}: Cannot read file - {e}", loaded.name)),
        }
    }
}

fn validate_accessibility(pages: &[LoadedPage], sink: &mut ReportSink) {
    sink.section("♿ Validating accessibility...");
    for loaded in pages {
        match &loaded.page {
            Ok(page) => {
                run_page_checks(sink, &loaded.name, page, ACCESSIBILITY_CHECKS, EntryKind::Warn)
            }
            Err(e) => sink.error(format!(
                "{}: Cannot validate accessibility - {e}",
                loaded.name
            )),
        }
    }
}

fn validate_assets(root: &Path, assets: &[String], sink: &mut ReportSink) {
    sink.section("🖼️  Validating assets...");
    for asset in assets {
        let path = root.join(asset);
        if !path.exists() {
            sink.fail(format!("Missing critical asset: {asset}"));
        } else if is_image(&path) {
            match image::image_dimensions(&path) {
                Ok((w, h)) => sink.pass(format!("Asset exists: {asset} ({w}x{h})")),
                Err(e) => sink.error(format!("Unreadable image asset: {asset} - {e}")),
            }
        } else {
            sink.pass(format!("Asset exists: {asset}"));
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
