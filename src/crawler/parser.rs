//! HTML parser for extracting and classifying links
//!
//! This module turns a loaded document into:
//! - The page title
//! - Every anchor worth following, resolved to an absolute URL, with a
//!   human-readable label and its placement on the page (nav/footer/content)
//!
//! Anchors inside language, locale or country pickers are dropped: they point
//! at translations of the current page, not at navigational intent.

use crate::state::LinkContext;
use crate::url::file_name;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Maximum length (in characters) of a link label
pub const MAX_LINK_TEXT: usize = 30;

/// Class/id fragments that mark an element as a locale picker
const LOCALE_PICKER_TOKENS: &[&str] = &[
    "lang",
    "language",
    "languages",
    "locale",
    "locales",
    "country",
    "countries",
    "i18n",
    "translate",
    "translations",
];

/// Elements whose contents are never visible text
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

/// Elements rendered on their own line
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "td", "th", "ul",
];

/// One anchor extracted from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute URL the anchor points at
    pub href: String,

    /// Human-readable label, at most `MAX_LINK_TEXT` characters
    pub text: String,

    /// Placement of the anchor on the page
    pub context: LinkContext,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct LoadedPage {
    /// The page title (from <title> tag), empty if missing
    pub title: String,

    /// Classified anchors, in document order
    pub anchors: Vec<ExtractedLink>,
}

/// Parses HTML content and extracts the title and classified anchors
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - Anchors inside a language/locale/country picker
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links (same page anchors)
/// - hrefs that cannot be resolved to an absolute HTTP(S) URL
///
/// Relative hrefs resolve against the document's `<base href>` when present,
/// otherwise against `page_url`.
///
/// # Example
///
/// ```
/// use page_atlas::crawler::parse_page;
/// use page_atlas::LinkContext;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head>
///     <body><nav><a href="/about">About us</a></nav></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let page = parse_page(html, &page_url);
///
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.anchors[0].href, "https://example.com/about");
/// assert_eq!(page.anchors[0].text, "About us");
/// assert_eq!(page.anchors[0].context, LinkContext::Nav);
/// ```
pub fn parse_page(html: &str, page_url: &Url) -> LoadedPage {
    let document = Html::parse_document(html);
    let base_url = document_base(&document, page_url);

    LoadedPage {
        title: extract_title(&document),
        anchors: extract_anchors(&document, &base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .unwrap_or_default()
}

/// Resolves the document's base URI
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|base| base.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

/// Extracts and classifies every followable anchor
fn extract_anchors(document: &Html, base_url: &Url) -> Vec<ExtractedLink> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut anchors = Vec::new();
    for element in document.select(&selector) {
        if in_locale_picker(&element) {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(href, base_url) else {
            tracing::trace!("Dropping unresolvable href: {}", href);
            continue;
        };

        anchors.push(ExtractedLink {
            text: link_text(&element, &absolute),
            context: classify_context(&element),
            href: absolute.to_string(),
        });
    }

    anchors
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

/// Classifies the anchor by its nearest structural region
///
/// Navigation/header regions win over footers, so a `<nav>` inside a
/// `<footer>` still counts as navigation.
pub fn classify_context(element: &ElementRef<'_>) -> LinkContext {
    let mut in_footer = false;

    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        let el = ancestor.value();
        let role = el.attr("role").unwrap_or_default();

        match el.name() {
            "nav" | "header" => return LinkContext::Nav,
            "footer" => in_footer = true,
            _ => {}
        }
        match role {
            "navigation" | "banner" => return LinkContext::Nav,
            "contentinfo" => in_footer = true,
            _ => {}
        }
    }

    if in_footer {
        LinkContext::Footer
    } else {
        LinkContext::Content
    }
}

/// Returns true if the anchor or any ancestor below `<body>` looks like a
/// locale picker
///
/// `<body>` and `<html>` are never pickers: CMSs tag them with the page's
/// locale (`i18n-en`, `lang-de`), which says nothing about the anchors.
fn in_locale_picker(element: &ElementRef<'_>) -> bool {
    std::iter::once(*element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .take_while(|el| !matches!(el.value().name(), "body" | "html"))
        .any(|el| is_locale_picker(&el))
}

fn is_locale_picker(element: &ElementRef<'_>) -> bool {
    let el = element.value();

    if el.attr("data-locale").is_some() || el.attr("data-language").is_some() {
        return true;
    }

    if el
        .attr("aria-label")
        .is_some_and(|label| label.to_lowercase().contains("language"))
    {
        return true;
    }

    el.id()
        .into_iter()
        .chain(el.classes())
        .flat_map(|name| name.split(['-', '_']))
        .any(|piece| LOCALE_PICKER_TOKENS.contains(&piece.to_ascii_lowercase().as_str()))
}

/// Derives a human-readable label for an anchor
///
/// First non-empty candidate wins: visible text, full text content,
/// `aria-label`, nested image `alt`, `title`, the URL's last path segment
/// (`Home` for the root), and finally the literal `Link`.
pub fn link_text(element: &ElementRef<'_>, target: &Url) -> String {
    let el = element.value();

    let mut visible = String::new();
    collect_visible_text(element, &mut visible);

    let candidates = [
        Some(visible),
        Some(element.text().collect::<String>()),
        el.attr("aria-label").map(str::to_string),
        image_alt(element),
        el.attr("title").map(str::to_string),
        Some(text_from_url(target)),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|candidate| collapse_whitespace(&candidate))
        .find(|candidate| !candidate.is_empty())
        .map(|text| truncate(&text, MAX_LINK_TEXT))
        .unwrap_or_else(|| "Link".to_string())
}

/// Collects text the way a browser's innerText would, skipping hidden subtrees
///
/// Inline children run into their neighbours; block children and `<br>` are
/// separated by whitespace.
fn collect_visible_text(element: &ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if is_hidden(&child_element) {
                continue;
            }

            let name = child_element.value().name();
            if name == "br" {
                out.push(' ');
                continue;
            }

            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push(' ');
            }
            collect_visible_text(&child_element, out);
            if block {
                out.push(' ');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    let el = element.value();
    INVISIBLE_ELEMENTS.contains(&el.name())
        || el.attr("hidden").is_some()
        || el.attr("aria-hidden") == Some("true")
}

fn image_alt(element: &ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("img[alt]").ok()?;
    element
        .select(&selector)
        .filter_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .find(|alt| !alt.is_empty())
        .map(str::to_string)
}

/// Label derived from the URL's last path segment
fn text_from_url(target: &Url) -> String {
    match file_name(target) {
        Some(segment) => segment.replace(['-', '_'], " "),
        None => "Home".to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect::<String>().trim_end().to_string()
}
