use crate::error::CrawlError;
use crate::results::CrawlReport;
use async_trait::async_trait;
use url::Url;

/// Something that can load a page and hand back its rendered source.
///
/// A browser session is the production implementation; tests use an
/// in-memory map of pages.
#[async_trait]
pub trait PageSource: Send {
    /// Navigate to `url`, wait until the document body is present and return
    /// the page source
    async fn fetch(&mut self, url: &Url) -> Result<String, CrawlError>;
}

/// Collaborator that turns a base domain into the crawled text of its site
#[async_trait]
pub trait SiteScraper: Send + Sync {
    async fn scrape_site(&self, base_url: &str) -> Result<CrawlReport, CrawlError>;
}
