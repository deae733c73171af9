//! Parsed HTML documents and the queries the checkers need.
//!
//! Pages are parsed with an HTML5 parser and inspected as a tree, never with
//! regular expressions over the source. One consequence: a conforming parser
//! always synthesizes `<html>`, `<head>` and `<body>`, so the one structural
//! question the tree cannot answer, whether the author wrote an explicit
//! `<html>…</html>` pair, is answered from the source text by
//! [`Page::has_explicit_html_element`].

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

fn selector(css: &'static str) -> Selector {
    // Only ever called with the literal selectors below.
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description" i]"#));
static META_VIEWPORT: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[name="viewport" i]"#));
static META_CHARSET: LazyLock<Selector> = LazyLock::new(|| selector("meta[charset]"));
static LANG: LazyLock<Selector> = LazyLock::new(|| selector("[lang]"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static ALT: LazyLock<Selector> = LazyLock::new(|| selector("[alt]"));
static ROLE: LazyLock<Selector> = LazyLock::new(|| selector("[role]"));
static HREF: LazyLock<Selector> = LazyLock::new(|| selector("[href]"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static ALL: LazyLock<Selector> = LazyLock::new(|| selector("*"));

/// Image attribute coverage for one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageCoverage {
    pub total: usize,
    pub lazy: usize,
    pub with_alt: usize,
}

impl ImageCoverage {
    /// Share of images with `loading="lazy"`, in percent. `None` without images.
    pub fn lazy_percentage(&self) -> Option<f64> {
        percentage(self.lazy, self.total)
    }

    /// Share of images carrying an `alt` attribute, in percent.
    pub fn alt_percentage(&self) -> Option<f64> {
        percentage(self.with_alt, self.total)
    }
}

fn percentage(part: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| part as f64 * 100.0 / total as f64)
}

/// A parsed page plus its source text.
pub struct Page {
    source: String,
    document: Html,
}

impl Page {
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let document = Html::parse_document(&source);
        Self { source, document }
    }

    fn has(&self, selector: &Selector) -> bool {
        self.document.select(selector).next().is_some()
    }

    pub fn has_title(&self) -> bool {
        self.has(&TITLE)
    }

    pub fn has_meta_description(&self) -> bool {
        self.has(&META_DESCRIPTION)
    }

    pub fn has_viewport_meta(&self) -> bool {
        self.has(&META_VIEWPORT)
    }

    pub fn has_charset_meta(&self) -> bool {
        self.has(&META_CHARSET)
    }

    /// Any element carries a `lang` attribute.
    pub fn has_lang_attribute(&self) -> bool {
        self.has(&LANG)
    }

    pub fn has_h1(&self) -> bool {
        self.has(&H1)
    }

    /// Any element carries an `alt` attribute.
    pub fn has_alt_attribute(&self) -> bool {
        self.has(&ALT)
    }

    pub fn has_role_attribute(&self) -> bool {
        self.has(&ROLE)
    }

    /// Any element carries an `aria-*` attribute.
    pub fn has_aria_attribute(&self) -> bool {
        self.document
            .select(&ALL)
            .any(|el| el.value().attrs().any(|(name, _)| name.starts_with("aria-")))
    }

    /// The document starts with `<!DOCTYPE html>` (case-insensitive).
    pub fn has_html5_doctype(&self) -> bool {
        self.document.tree.root().children().any(|node| {
            node.value()
                .as_doctype()
                .is_some_and(|d| d.name().eq_ignore_ascii_case("html"))
        })
    }

    /// The source text contains an opening `<html` and a closing `</html>`.
    pub fn has_explicit_html_element(&self) -> bool {
        let lower = self.source.to_ascii_lowercase();
        lower.contains("<html") && lower.contains("</html>")
    }

    /// Every `href` value in document order.
    pub fn hrefs(&self) -> Vec<String> {
        self.document
            .select(&HREF)
            .filter_map(|el| el.value().attr("href"))
            .map(|href| href.trim().to_string())
            .collect()
    }

    pub fn image_coverage(&self) -> ImageCoverage {
        self.document
            .select(&IMG)
            .fold(ImageCoverage::default(), |mut acc, img| {
                acc.total += 1;
                if is_lazy(img) {
                    acc.lazy += 1;
                }
                if img.value().attr("alt").is_some() {
                    acc.with_alt += 1;
                }
                acc
            })
    }
}

fn is_lazy(img: ElementRef<'_>) -> bool {
    img.value()
        .attr("loading")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("lazy"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = "<html><head></head><body></body></html>";
    const COMPLETE: &str = r#"<html><head><title>T</title><meta name="description" content="d"><meta name="viewport" content="w"></head><body lang="en"><h1>H</h1></body></html>"#;

    #[test]
    fn empty_document_lacks_required_elements() {
        let page = Page::parse(EMPTY);
        assert!(!page.has_title());
        assert!(!page.has_meta_description());
        assert!(!page.has_viewport_meta());
        assert!(!page.has_lang_attribute());
        assert!(!page.has_h1());
    }

    #[test]
    fn complete_document_has_required_elements() {
        let page = Page::parse(COMPLETE);
        assert!(page.has_title());
        assert!(page.has_meta_description());
        assert!(page.has_viewport_meta());
        assert!(page.has_lang_attribute());
        assert!(page.has_h1());
    }

    #[test]
    fn doctype_detection() {
        assert!(Page::parse("<!DOCTYPE html><html></html>").has_html5_doctype());
        assert!(Page::parse("<!doctype html><html></html>").has_html5_doctype());
        assert!(!Page::parse(EMPTY).has_html5_doctype());
    }

    #[test]
    fn explicit_html_element_from_source() {
        assert!(Page::parse(EMPTY).has_explicit_html_element());
        assert!(Page::parse("<HTML lang=en><body></body></HTML>").has_explicit_html_element());
        assert!(!Page::parse("<p>fragment</p>").has_explicit_html_element());
        assert!(!Page::parse("<html><body>").has_explicit_html_element());
    }

    #[test]
    fn charset_meta() {
        assert!(Page::parse(r#"<head><meta charset="utf-8"></head>"#).has_charset_meta());
        assert!(!Page::parse(EMPTY).has_charset_meta());
    }

    #[test]
    fn accessibility_attributes() {
        let page = Page::parse(
            r#"<nav role="navigation"><button aria-label="Menu">=</button><img src="a.png" alt=""></nav>"#,
        );
        assert!(page.has_role_attribute());
        assert!(page.has_aria_attribute());
        assert!(page.has_alt_attribute());

        let bare = Page::parse("<div><img src=a.png></div>");
        assert!(!bare.has_role_attribute());
        assert!(!bare.has_aria_attribute());
        assert!(!bare.has_alt_attribute());
    }

    #[test]
    fn hrefs_in_document_order() {
        let page = Page::parse(
            r##"<link rel="stylesheet" href="assets/css/main.css"><a href=" about.html ">About</a><a>none</a><a href="#top">Top</a>"##,
        );
        assert_eq!(
            page.hrefs(),
            vec!["assets/css/main.css", "about.html", "#top"]
        );
    }

    #[test]
    fn image_coverage_nine_of_ten_lazy() {
        let mut html = String::new();
        for i in 0..10 {
            let loading = if i < 9 { r#" loading="lazy""# } else { "" };
            html.push_str(&format!(r#"<img src="{i}.png" alt="x"{loading}>"#));
        }
        let coverage = Page::parse(html).image_coverage();
        assert_eq!(coverage.total, 10);
        assert_eq!(coverage.lazy, 9);
        assert_eq!(coverage.lazy_percentage(), Some(90.0));
        assert_eq!(coverage.alt_percentage(), Some(100.0));
    }

    #[test]
    fn image_coverage_without_images() {
        let coverage = Page::parse(EMPTY).image_coverage();
        assert_eq!(coverage, ImageCoverage::default());
        assert_eq!(coverage.lazy_percentage(), None);
    }

    #[test]
    fn loading_eager_is_not_lazy() {
        let coverage = Page::parse(r#"<img loading="eager"><img loading="LAZY">"#).image_coverage();
        assert_eq!(coverage.lazy, 1);
        assert_eq!(coverage.with_alt, 0);
    }
}
