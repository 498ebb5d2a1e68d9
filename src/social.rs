//! Official social-media profiles linked from a company's homepage

use crate::error::FetchError;
use crate::filter::parse_base_url;
use crate::http::HttpSession;
use crate::parsers::html::extract_anchors;
use async_trait::async_trait;
use scraper::Html;
use std::fmt;
use url::Url;

/// Platforms looked for, each with the hosts that identify it
pub const PLATFORMS: [(&str, &[&str]); 8] = [
    ("LinkedIn", &["linkedin.com"]),
    ("Twitter/X", &["twitter.com", "x.com"]),
    ("Facebook", &["facebook.com"]),
    ("Instagram", &["instagram.com"]),
    ("YouTube", &["youtube.com"]),
    ("TikTok", &["tiktok.com"]),
    ("Reddit", &["reddit.com"]),
    ("WhatsApp", &["whatsapp.com", "wa.me"]),
];

/// First profile link found per platform, in platform order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialLinks {
    pub links: Vec<(&'static str, String)>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, platform: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|(name, _)| *name == platform)
            .map(|(_, url)| url.as_str())
    }
}

impl fmt::Display for SocialLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.links.is_empty() {
            return f.write_str("[No social media links found on company website]");
        }
        f.write_str("Social media links found by scanning website:")?;
        for (platform, url) in &self.links {
            write!(f, "\n- {}: {}", platform, url)?;
        }
        Ok(())
    }
}

/// A provider of a company's social profiles
#[async_trait]
pub trait SocialLinkFinder: Send + Sync {
    async fn find_links(&self, domain: &str) -> Result<SocialLinks, FetchError>;
}

/// Whether `host` belongs to `pattern`: equal to it or a subdomain of it
fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern || host.strip_suffix(pattern).is_some_and(|rest| rest.ends_with('.'))
}

fn platform_of(url: &Url) -> Option<&'static str> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    PLATFORMS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|pattern| host_matches(host, pattern)))
        .map(|(name, _)| *name)
}

/// Social links among the anchors of `html`, resolved against `page_url`
pub fn social_links_in(html: &str, page_url: &Url) -> SocialLinks {
    let doc = Html::parse_document(html);
    let mut found = SocialLinks::default();

    for anchor in extract_anchors(&doc) {
        let href = anchor.href.as_str();
        if href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }
        let Ok(url) = page_url.join(href) else {
            continue;
        };
        let Some(platform) = platform_of(&url) else {
            continue;
        };
        if found.get(platform).is_none() {
            ::log::debug!("Found {} link: {}", platform, url);
            found.links.push((platform, url.to_string()));
        }
    }

    found.links.sort_by_key(|(platform, _)| {
        PLATFORMS
            .iter()
            .position(|(name, _)| name == platform)
            .unwrap_or(PLATFORMS.len())
    });
    found
}

/// Scans the homepage over plain HTTP
#[derive(Debug, Clone)]
pub struct HomepageSocialScraper {
    http: HttpSession,
}

impl HomepageSocialScraper {
    pub fn new(http: HttpSession) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SocialLinkFinder for HomepageSocialScraper {
    async fn find_links(&self, domain: &str) -> Result<SocialLinks, FetchError> {
        let url = parse_base_url(domain)?;
        ::log::info!("Searching for social media links on: {}", url);

        let (final_url, html) = self.http.get_page(url.as_str()).await?;
        let links = social_links_in(&html, &final_url);
        ::log::info!("Found {} social media links on {}", links.links.len(), final_url);
        Ok(links)
    }
}
