pub mod html;
pub mod text;


use html::Anchor;
use scraper::Html;

/// How much of a page's text to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentScope {
    /// The whole `<body>`
    WholePage,
    /// The first structural content region, falling back to the whole body
    MainContent,
}

/// Result of parsing a rendered page
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Extracted text content
    pub content: String,
    /// Selector that narrowed the content, `None` when the whole body was used
    pub content_selector: Option<&'static str>,
    /// Every hyperlink of the page
    pub links: Vec<Anchor>,
}

/// Parser for rendered page sources
pub struct Parser;

impl Parser {
    /// Parse a page source into text and links
    pub fn parse(source: &str, scope: ContentScope) -> ParseResult {
        let doc = Html::parse_document(source);
        let links = html::extract_anchors(&doc);

        let narrowed = match scope {
            ContentScope::MainContent => html::main_content_text(&doc),
            ContentScope::WholePage => None,
        };

        let (content_selector, content) = match narrowed {
            Some((selector, text)) => (Some(selector), text),
            None => (None, html::body_text(&doc).unwrap_or_default()),
        };

        ParseResult {
            content,
            content_selector,
            links,
        }
    }
}
