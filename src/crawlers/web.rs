use crate::config::CrawlConfig;
use crate::crawlers::crawler::{PageSource, SiteScraper};
use crate::crawlers::site::SiteCrawler;
use crate::error::CrawlError;
use crate::filter::parse_base_url;
use crate::results::CrawlReport;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

/// Well-known WebDriver endpoints tried when the configured one refuses a session
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// A headless browser session with a disposable profile directory.
///
/// Both are released by [`BrowserSession::close`]. If the session is dropped
/// instead, fantoccini ends the WebDriver session when the client goes away and
/// the profile directory is removed with its `TempDir`.
pub struct BrowserSession {
    client: Option<Client>,
    profile_dir: Option<TempDir>,
    wait_timeout: Duration,
}

impl BrowserSession {
    /// Create the profile directory and open a WebDriver session using it
    pub async fn start(config: &CrawlConfig, user_agent: &str) -> Result<Self, CrawlError> {
        let profile_dir = tempfile::Builder::new()
            .prefix("chrome_profile_")
            .tempdir()?;
        ::log::debug!("Using browser profile directory {}", profile_dir.path().display());

        let capabilities = chrome_capabilities(config.headless, user_agent, profile_dir.path());
        let client = connect_to_webdriver(&config.webdriver_url, &capabilities).await?;

        let timeouts = TimeoutConfiguration::new(None, Some(config.page_load_timeout()), None);
        if let Err(e) = client.update_timeouts(timeouts).await {
            ::log::warn!("Could not set page load timeout: {}", e);
        }

        Ok(Self {
            client: Some(client),
            profile_dir: Some(profile_dir),
            wait_timeout: config.wait_timeout(),
        })
    }

    /// End the WebDriver session and remove the profile directory
    pub async fn close(mut self) {
        if let Some(client) = self.client.take() {
            ::log::info!("Closing browser session");
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close browser session: {}", e);
            }
        }
        if let Some(dir) = self.profile_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                ::log::warn!("Failed to remove profile directory {}: {}", path.display(), e);
            }
        }
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn fetch(&mut self, url: &Url) -> Result<String, CrawlError> {
        let client = self.client.as_ref().ok_or_else(|| CrawlError::Driver {
            url: url.to_string(),
            message: "browser session already closed".to_string(),
        })?;

        client
            .goto(url.as_str())
            .await
            .map_err(|e| navigation_error(e, "accessing", url))?;

        client
            .wait()
            .at_most(self.wait_timeout)
            .for_element(Locator::Css("body"))
            .await
            .map_err(|e| navigation_error(e, "waiting for body of", url))?;

        client
            .source()
            .await
            .map_err(|e| navigation_error(e, "getting source for", url))
    }
}

/// Chrome capabilities for an isolated, optionally headless session
fn chrome_capabilities(headless: bool, user_agent: &str, profile_dir: &Path) -> Map<String, Value> {
    let mut args = Vec::new();
    if headless {
        args.push("--headless".to_string());
    }
    args.push("--no-sandbox".to_string());
    args.push("--disable-dev-shm-usage".to_string());
    args.push(format!("--user-agent={}", user_agent));
    args.push("--log-level=3".to_string());
    args.push(format!("--user-data-dir={}", profile_dir.display()));

    let mut capabilities = Map::new();
    capabilities.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": args, "excludeSwitches": ["enable-logging"] }),
    );
    capabilities
}

/// Connects to the WebDriver instance, trying the well-known ports after the configured URL
async fn connect_to_webdriver(
    webdriver_url: &str,
    capabilities: &Map<String, Value>,
) -> Result<Client, CrawlError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities.clone());

    let first_error = match builder.connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            e.to_string()
        }
    };

    for url in FALLBACK_WEBDRIVER_URLS {
        if url == webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = builder.connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(CrawlError::SessionStart(format!("{}: {}", webdriver_url, first_error)))
}

/// Classify a failed browser command
fn navigation_error(error: CmdError, context: &str, url: &Url) -> CrawlError {
    if matches!(error, CmdError::WaitTimeout) {
        return CrawlError::Timeout(url.to_string());
    }
    if error.is_no_such_element() {
        return CrawlError::MissingBody(url.to_string());
    }

    let message = error.to_string();
    if message.contains("Unable to find session") {
        ::log::warn!("Lost browser session while {} {}", context, url);
    } else if message.to_lowercase().contains("timeout") {
        return CrawlError::Timeout(url.to_string());
    }
    CrawlError::Driver {
        url: url.to_string(),
        message: format!("{} failed: {}", context, message),
    }
}

/// Site scraper backed by a fresh browser session per crawl
#[derive(Debug, Clone)]
pub struct WebDriverScraper {
    config: CrawlConfig,
    user_agent: String,
}

impl WebDriverScraper {
    pub fn new(config: CrawlConfig, user_agent: impl Into<String>) -> Self {
        Self {
            config,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl SiteScraper for WebDriverScraper {
    async fn scrape_site(&self, base_url: &str) -> Result<CrawlReport, CrawlError> {
        let base = parse_base_url(base_url)
            .map_err(|e| CrawlError::InvalidBaseUrl(format!("{} ({})", base_url, e)))?;

        let mut session = BrowserSession::start(&self.config, &self.user_agent).await?;
        let result = SiteCrawler::from_config(&self.config)
            .crawl(&mut session, &base)
            .await;
        session.close().await;

        result
    }
}
