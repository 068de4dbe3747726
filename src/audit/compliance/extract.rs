//! On-page SEO signal extraction from rendered HTML.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::discovery::same_origin;
use crate::models::PageSignals;

/// Share of images that must be WebP/AVIF/data URIs for a page to count as modern.
const MODERN_FORMAT_THRESHOLD: f64 = 0.8;

/// Elements whose text never renders.
const HIDDEN_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Filename heuristic only. The byte size is never inspected.
static LARGE_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png)$").unwrap());

static MODERN_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.(webp|avif)$").unwrap());

static SELECTORS: LazyLock<Selectors> = LazyLock::new(Selectors::new);

struct Selectors {
    title: Selector,
    description: Selector,
    canonical: Selector,
    h1: Selector,
    body: Selector,
    anchors: Selector,
    viewport: Selector,
    schema: Selector,
    images: Selector,
}

impl Selectors {
    fn new() -> Self {
        let parse = |s: &str| Selector::parse(s).unwrap();
        Self {
            title: parse("title"),
            description: parse(r#"meta[name="description"]"#),
            canonical: parse(r#"link[rel="canonical"]"#),
            h1: parse("h1"),
            body: parse("body"),
            anchors: parse("a[href]"),
            viewport: parse(r#"meta[name="viewport"]"#),
            schema: parse(r#"script[type="application/ld+json"]"#),
            images: parse("img"),
        }
    }
}

/// Turns a rendered page into [`PageSignals`].
///
/// Site-level probe results (`robots_txt_found`, `sitemap_found`) are left
/// false; the auditor fills them in.
pub trait SignalExtractor: Send + Sync {
    fn extract(&self, html: &str, page_url: &Url) -> PageSignals;
}

/// DOM-based extractor over the serialized document.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomSignalExtractor;

impl SignalExtractor for DomSignalExtractor {
    fn extract(&self, html: &str, page_url: &Url) -> PageSignals {
        let document = Html::parse_document(html);
        let s = &*SELECTORS;

        let title = document
            .select(&s.title)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let description = document
            .select(&s.description)
            .next()
            .and_then(|m| m.value().attr("content"))
            .unwrap_or_default()
            .to_string();

        let canonical = document
            .select(&s.canonical)
            .next()
            .and_then(|l| l.value().attr("href"))
            .and_then(|href| resolve(page_url, href))
            .unwrap_or_default();

        let word_count = document
            .select(&s.body)
            .next()
            .map(|body| {
                let mut text = String::new();
                visible_text(body, &mut text);
                text.split_whitespace().count()
            })
            .unwrap_or(0);

        let internal_links_count = document
            .select(&s.anchors)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| page_url.join(href.trim()).ok())
            .filter(|u| same_origin(u, page_url))
            .count();

        let images: Vec<ElementRef> = document.select(&s.images).collect();
        let images_missing_alt = images
            .iter()
            .filter(|img| {
                img.value()
                    .attr("alt")
                    .map(|alt| alt.trim().is_empty())
                    .unwrap_or(true)
            })
            .count();

        let sources: Vec<Option<String>> = images
            .iter()
            .map(|img| img.value().attr("src").and_then(|src| resolve(page_url, src)))
            .collect();

        let large_images = sources
            .iter()
            .flatten()
            .filter(|src| LARGE_IMAGE.is_match(src))
            .cloned()
            .collect();

        PageSignals {
            url: page_url.to_string(),
            title,
            description,
            canonical,
            h1_count: document.select(&s.h1).count(),
            word_count,
            internal_links_count,
            has_viewport: document.select(&s.viewport).next().is_some(),
            has_schema: document.select(&s.schema).next().is_some(),
            images_missing_alt,
            large_images,
            uses_modern_format: uses_modern_format(&sources),
            robots_txt_found: false,
            sitemap_found: false,
        }
    }
}

fn resolve(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    page_url.join(href).ok().map(|u| u.to_string())
}

/// True when at least 80% of images use a modern encoding, or there are none.
fn uses_modern_format(sources: &[Option<String>]) -> bool {
    if sources.is_empty() {
        return true;
    }
    let modern = sources
        .iter()
        .flatten()
        .filter(|src| {
            let path = src.split('?').next().unwrap_or_default();
            path.starts_with("data:image/") || MODERN_IMAGE.is_match(path)
        })
        .count();
    modern as f64 / sources.len() as f64 >= MODERN_FORMAT_THRESHOLD
}

fn visible_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(el) if HIDDEN_TEXT_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    visible_text(child, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> PageSignals {
        DomSignalExtractor.extract(html, &Url::parse("https://example.com/page").unwrap())
    }

    #[test]
    fn test_extracts_meta_tags() {
        let signals = extract(
            r#"<html><head>
                <title> Widgets for every workshop </title>
                <meta name="description" content="Hand-built widgets.">
                <link rel="canonical" href="/page">
                <meta name="viewport" content="width=device-width, initial-scale=1">
                <script type="application/ld+json">{"@type":"Organization"}</script>
            </head><body><h1>Widgets</h1></body></html>"#,
        );
        assert_eq!(signals.url, "https://example.com/page");
        assert_eq!(signals.title, "Widgets for every workshop");
        assert_eq!(signals.description, "Hand-built widgets.");
        assert_eq!(signals.canonical, "https://example.com/page");
        assert_eq!(signals.h1_count, 1);
        assert!(signals.has_viewport);
        assert!(signals.has_schema);
    }

    #[test]
    fn test_missing_tags_are_empty() {
        let signals = extract("<html><body><p>hello</p></body></html>");
        assert!(signals.title.is_empty());
        assert!(signals.description.is_empty());
        assert!(signals.canonical.is_empty());
        assert_eq!(signals.h1_count, 0);
        assert!(!signals.has_viewport);
        assert!(!signals.has_schema);
    }

    #[test]
    fn test_word_count_skips_scripts_and_styles() {
        let signals = extract(
            r#"<html><body>
                <p>one two   three</p>
                <script>var ignored = "four five";</script>
                <style>.x { color: red }</style>
                <div><span>four</span> five</div>
            </body></html>"#,
        );
        assert_eq!(signals.word_count, 5);
    }

    #[test]
    fn test_internal_links_counted_against_page_origin() {
        let signals = extract(
            r#"<body>
                <a href="/a">a</a>
                <a href="/a">a again</a>
                <a href="https://example.com/b">b</a>
                <a href="https://elsewhere.com/">x</a>
            </body>"#,
        );
        assert_eq!(signals.internal_links_count, 3);
    }

    #[test]
    fn test_image_signals() {
        let signals = extract(
            r#"<body>
                <img src="/hero.JPG" alt="Hero">
                <img src="/logo.webp" alt="">
                <img src="/photo.png?w=200">
                <img src="/icon.avif" alt="icon">
            </body>"#,
        );
        assert_eq!(signals.images_missing_alt, 2);
        // The query string defeats the extension match, as it always has.
        assert_eq!(signals.large_images, vec!["https://example.com/hero.JPG"]);
        assert!(!signals.uses_modern_format);
    }

    #[test]
    fn test_large_image_is_a_filename_heuristic() {
        // Known limitation: a tiny JPEG is flagged and a huge WebP is not.
        let signals = extract(r#"<img src="/1x1.jpg" alt="pixel"><img src="/huge.webp" alt="big">"#);
        assert_eq!(signals.large_images.len(), 1);
    }

    #[test]
    fn test_modern_format_threshold() {
        assert!(uses_modern_format(&[]));
        let mostly_modern = vec![
            Some("https://x.com/a.webp".to_string()),
            Some("https://x.com/b.avif?v=2".to_string()),
            Some("data:image/png;base64,AAAA".to_string()),
            Some("https://x.com/c.webp".to_string()),
            Some("https://x.com/d.jpg".to_string()),
        ];
        assert!(uses_modern_format(&mostly_modern));

        let missing_src = vec![Some("https://x.com/a.webp".to_string()), None];
        assert!(!uses_modern_format(&missing_src));
    }
}
