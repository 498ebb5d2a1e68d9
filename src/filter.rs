use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Extensions of links that never lead to a readable document
pub const EXCLUDED_EXTENSIONS: [&str; 27] = [
    "pdf", "jpg", "jpeg", "png", "gif", "svg", "webp", "zip", "rar", "tar", "gz", "doc", "docx",
    "xls", "xlsx", "ppt", "pptx", "mp3", "mp4", "avi", "mov", "css", "js", "xml", "rss", "txt",
    "json",
];

/// Canonical comparison key of a page: `scheme://host/path` with the `www.`
/// prefix, the trailing slash, the query and the fragment removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Build the key of an already absolute URL
    pub fn from_url(url: &Url) -> Option<Self> {
        let host = site_host(url)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host,
        };
        let path = url.path().trim_end_matches('/');
        Some(Self(format!("{}://{}{}", url.scheme(), authority, path)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercased host of a URL with any leading `www.` removed
pub fn site_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    })
}

/// Resolve a raw href against the page it was found on.
///
/// Returns `None` for hrefs that cannot be parsed or that are not http(s)
/// (javascript:, mailto:, tel:, data: ...). The fragment is dropped.
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

/// Resolve and canonicalize a raw href in one step
pub fn normalize_url(href: &str, base: &Url) -> Option<NormalizedUrl> {
    resolve_href(href, base).and_then(|url| NormalizedUrl::from_url(&url))
}

/// Turn a domain or URL typed by a user into a navigable URL, assuming https
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("https://{}", raw))
    }
}

/// Configuration for URL filtering during the site crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Host every crawled link must share (compared without `www.`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_host: Option<String>,

    /// Extra regex patterns for URLs to exclude
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// URL filter restricting a crawl to readable pages of one site
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            config,
            exclude_regexes,
        })
    }

    /// Filter bound to the host of `base`
    pub fn for_site(base: &Url, exclude_patterns: &[String]) -> Result<Self, regex::Error> {
        Self::new(UrlFilterConfig {
            required_host: site_host(base),
            exclude_patterns: exclude_patterns.to_vec(),
        })
    }

    /// Determine if a resolved URL should be crawled
    pub fn should_crawl(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        if !self.is_same_site(url) {
            return false;
        }

        if has_excluded_extension(url) {
            return false;
        }

        let url_str = url.as_str();
        !self.exclude_regexes.iter().any(|regex| regex.is_match(url_str))
    }

    /// Check if a URL belongs to the required host after `www.` aliasing
    fn is_same_site(&self, url: &Url) -> bool {
        match &self.config.required_host {
            Some(required) => site_host(url).as_deref() == Some(required.as_str()),
            None => true,
        }
    }
}

/// Whether the URL path ends in a known non-document extension
pub fn has_excluded_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => EXCLUDED_EXTENSIONS.contains(&ext),
        _ => false,
    }
}
