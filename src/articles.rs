//! Press-release articles about the prospect, scraped from a newswire site's
//! keyword search and summarized for sales context.

use crate::config::ArticleConfig;
use crate::error::FetchError;
use crate::http::HttpSession;
use crate::llm::ChatModel;
use crate::llm::prompts::summarize_article;
use crate::parsers::html::element_text;
use crate::parsers::text::{normalize_paragraphs, normalize_whitespace_in_segment};
use crate::results::Article;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Listing containers, in the order they are looked for
const LISTING_CONTAINERS: [&str; 3] = [
    "div.results-section",
    "div#news-results-tabsContent",
    "div.recentNewsH",
];

const BODY_CLASS_SELECTORS: [&str; 5] = [
    "div.article-body",
    "div.main-body-container.article-body",
    "div.story-content",
    "div.entry-content",
    "div.article__content",
];

const LISTING_DATE_FORMATS: [&str; 3] = ["%B %d, %Y %H:%M", "%b %d, %Y %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Article bodies at or below this many characters are treated as missing
const MIN_BODY_CHARS: usize = 50;

static TZ_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(ET|EST|EDT|PT|PST|PDT|CT|CST|CDT|MT|MST|MDT|GMT|UTC)$").unwrap()
});

/// One entry of the search listing, before its article is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    pub title: String,
    pub url: String,
    pub date: String,
    pub source: String,
}

/// A provider of articles about a company
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Articles with retrievable content, summarized when `model` is given
    async fn articles(
        &self,
        company: &str,
        model: Option<&dyn ChatModel>,
    ) -> Result<Vec<Article>, FetchError>;
}

/// Listing date rendered as `%Y-%m-%d %H:%M:%S`, or the raw text when it matches no known format
pub fn parse_listing_date(raw: &str) -> String {
    let raw = raw.trim();
    let cleaned = TZ_SUFFIX_RE.replace(raw, "");
    let cleaned = cleaned.trim();
    for format in LISTING_DATE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(cleaned, format) {
            return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
        }
    }
    ::log::warn!("Could not parse listing date '{}', keeping it verbatim", raw);
    raw.to_string()
}

fn inline_text(element: ElementRef<'_>) -> String {
    normalize_whitespace_in_segment(&element_text(element))
}

fn first_match<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Entries of a search listing page, duplicates removed, in page order
pub fn parse_listing(html: &str, base: &Url) -> Vec<ListingItem> {
    let doc = Html::parse_document(html);

    let container = LISTING_CONTAINERS.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        doc.select(&selector).next()
    });
    let Some(container) = container else {
        ::log::warn!("No news listing container found on search page");
        return Vec::new();
    };

    let item_selector = Selector::parse("li.list-result, li.row").unwrap();
    let date_source_selector = Selector::parse("div.date-source").unwrap();
    let main_link_selector = Selector::parse(
        "div[class*=\"mainLink\"], h3[class*=\"mainLink\"], div[class*=\"post-title\"], h3[class*=\"post-title\"]",
    )
    .unwrap();
    let span_selector = Selector::parse("span").unwrap();
    let source_selector = Selector::parse("a.sourceLink").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for (index, item) in container.select(&item_selector).enumerate() {
        let (Some(date_source), Some(main_link)) = (
            first_match(item, &date_source_selector),
            first_match(item, &main_link_selector),
        ) else {
            ::log::debug!("Skipping listing item {}: missing date or title block", index);
            continue;
        };

        let date_text = first_match(date_source, &span_selector)
            .map(inline_text)
            .unwrap_or_default();
        if date_text.is_empty() {
            ::log::warn!("Skipping listing item {}: no date", index);
            continue;
        }

        let source = first_match(date_source, &source_selector)
            .map(inline_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Source Not Found".to_string());

        let Some(link) = first_match(main_link, &anchor_selector) else {
            ::log::warn!("Skipping listing item {}: no article link", index);
            continue;
        };
        let Some(url) = link
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| base.join(href).ok())
        else {
            ::log::warn!("Skipping listing item {}: invalid article link", index);
            continue;
        };

        let url = url.to_string();
        if !seen.insert(url.clone()) {
            ::log::debug!("Skipping duplicate article {}", url);
            continue;
        }

        let title = Some(inline_text(link))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Title Not Found".to_string());

        items.push(ListingItem {
            title,
            url,
            date: parse_listing_date(&date_text),
            source,
        });
    }

    ::log::info!("Found {} listing entries", items.len());
    items
}

fn long_enough(text: &str) -> bool {
    text.chars().count() > MIN_BODY_CHARS
}

/// Readable body of an article page
pub fn extract_article_body(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    let body_selector = Selector::parse("div[itemprop=\"articleBody\"]").unwrap();
    if let Some(body) = doc.select(&body_selector).next() {
        let part_selector = Selector::parse("p, ul, ol, li, h2, h3, h4, div").unwrap();
        let nested_selector = Selector::parse("p, ul").unwrap();

        let parts: Vec<String> = body
            .select(&part_selector)
            .filter(|part| {
                part.value().name() != "div" || part.select(&nested_selector).next().is_none()
            })
            .map(inline_text)
            .filter(|text| !text.is_empty())
            .collect();
        let joined = normalize_paragraphs(&parts.join("\n\n"));
        if long_enough(&joined) {
            ::log::info!("Extracted article body from structured parts ({} chars)", joined.len());
            return Some(joined);
        }

        let plain = normalize_paragraphs(&element_text(body));
        if long_enough(&plain) {
            ::log::info!("Extracted article body from plain text ({} chars)", plain.len());
            return Some(plain);
        }
    }

    for selector_str in BODY_CLASS_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = doc.select(&selector).next() {
            let text = normalize_paragraphs(&element_text(element));
            if long_enough(&text) {
                ::log::info!("Extracted article body with '{}' ({} chars)", selector_str, text.len());
                return Some(text);
            }
        }
    }

    None
}

/// Keyword search scraper for a newswire site
#[derive(Debug, Clone)]
pub struct PressReleaseScraper {
    http: HttpSession,
    base_url: Url,
    max_articles: usize,
    request_delay: Duration,
}

impl PressReleaseScraper {
    pub fn new(http: HttpSession, config: &ArticleConfig, request_delay: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            max_articles: config.max_articles,
            request_delay,
        })
    }

    /// Listing URL for `company`, sized to leave room for entries without content
    pub fn search_url(&self, company: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["en", "search", "keyword", company]);
        url.query_pairs_mut()
            .append_pair("pageSize", &(self.max_articles * 2 + 5).to_string());
        Ok(url)
    }

    async fn fetch_body(&self, url: &str) -> Option<String> {
        tokio::time::sleep(self.request_delay).await;
        match self.http.get_text(url).await {
            Ok(html) => extract_article_body(&html),
            Err(e) => {
                ::log::error!("Error fetching article {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl ArticleSource for PressReleaseScraper {
    async fn articles(
        &self,
        company: &str,
        model: Option<&dyn ChatModel>,
    ) -> Result<Vec<Article>, FetchError> {
        let search_url = self.search_url(company)?;
        ::log::info!("Searching press releases for '{}' at {}", company, search_url);

        tokio::time::sleep(self.request_delay).await;
        let listing_html = self.http.get_text(search_url.as_str()).await?;
        let listing = parse_listing(&listing_html, &self.base_url);

        let mut articles = Vec::new();
        for item in listing {
            if articles.len() >= self.max_articles {
                ::log::info!("Reached article limit ({})", self.max_articles);
                break;
            }

            ::log::info!(
                "Processing article {}/{}: {}",
                articles.len() + 1,
                self.max_articles,
                item.title
            );
            let Some(content) = self.fetch_body(&item.url).await else {
                ::log::warn!("Skipping article without retrievable content: {}", item.url);
                continue;
            };

            let summary = summarize_article(model, company, &content).await;
            articles.push(Article {
                title: item.title,
                url: item.url,
                date: item.date,
                source: item.source,
                content,
                summary,
            });
        }

        ::log::info!("Collected {} articles for {}", articles.len(), company);
        Ok(articles)
    }
}
