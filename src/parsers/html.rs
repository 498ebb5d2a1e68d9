use crate::parsers::text::TextBuilder;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};

/// Structural selectors tried, in order, to narrow a page to its main content
pub const MAIN_CONTENT_SELECTORS: [&str; 14] = [
    "article",
    "[role=\"article\"]",
    "main",
    "[role=\"main\"]",
    ".content",
    ".main-content",
    ".page-content",
    ".entry-content",
    ".post-content",
    "#content",
    "#main",
    "#page-content",
    "div[class*=\"content\"]",
    "div[id*=\"content\"]",
];

/// Elements whose contents never count as readable text
const SKIPPED_TAGS: [&str; 7] = ["script", "style", "noscript", "template", "svg", "head", "iframe"];

/// Elements that start a new line of text
const BLOCK_TAGS: [&str; 34] = [
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "td",
    "tr", "ul",
];

/// A hyperlink as it appears in the markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub href: String,
    pub text: String,
    pub title: Option<String>,
}

/// Rendered text of an element, one line per block, scripts and styles skipped
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut builder = TextBuilder::new();
    collect_text(element, &mut builder);
    builder.finish()
}

fn collect_text(element: ElementRef<'_>, out: &mut TextBuilder) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_inline(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.break_line();
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    let block = BLOCK_TAGS.contains(&name);
                    if block {
                        out.break_line();
                    }
                    collect_text(child_element, out);
                    if block {
                        out.break_line();
                    }
                }
            }
            _ => {}
        }
    }
}

/// Text of the whole `<body>`
pub fn body_text(doc: &Html) -> Option<String> {
    let selector = Selector::parse("body").unwrap();
    doc.select(&selector).next().map(element_text)
}

/// Text of the first structural content region that holds any text.
///
/// Returns the selector that matched along with the text.
pub fn main_content_text(doc: &Html) -> Option<(&'static str, String)> {
    for selector_str in MAIN_CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = doc.select(&selector).next() {
            let text = element_text(element);
            if !text.is_empty() {
                ::log::debug!("Found content with selector: {}", selector_str);
                return Some((selector_str, text));
            }
        }
    }
    None
}

/// Every `<a href>` of the document with its visible text and title attribute
pub fn extract_anchors(doc: &Html) -> Vec<Anchor> {
    let link_selector = Selector::parse("a[href]").unwrap();
    let anchors = doc
        .select(&link_selector)
        .filter_map(|e| {
            let href = e.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            Some(Anchor {
                href: href.to_string(),
                text: element_text(e).replace('\n', " "),
                title: e
                    .value()
                    .attr("title")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            })
        })
        .collect::<Vec<_>>();

    ::log::debug!("HTML parser found {} links", anchors.len());
    anchors
}
