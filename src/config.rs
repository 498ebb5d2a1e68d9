use crate::error::ProfileError;
use crate::scoring::ScoringPolicy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Browser user agent sent by both the WebDriver session and plain HTTP requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.75 Safari/537.36";

/// Credential values that ship in sample env files and must be treated as absent
const PLACEHOLDER_KEYS: [&str; 2] = ["YOUR_BRAVE_SEARCH_API_KEY", "YOUR_BRAVE_API_KEY_PLACEHOLDER"];

/// Configuration for the website crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Skip the crawl entirely
    #[serde(default)]
    pub disabled: bool,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Maximum number of subpages visited after the homepage
    #[serde(default = "default_max_subpages")]
    pub max_subpages: usize,

    /// Cap on the combined text returned by the crawl
    #[serde(default = "default_max_total_chars")]
    pub max_total_chars: usize,

    /// Browser page-load timeout in seconds
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    /// How long to wait for a page body to appear
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// How candidates are ranked
    #[serde(default)]
    pub scoring_policy: ScoringPolicy,

    /// Regex patterns for URLs to exclude in addition to the built-in extension list
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Configuration for the search API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Subscription token
    #[serde(default)]
    pub api_key: Option<String>,

    /// Search endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Market sent with every query
    #[serde(default = "default_country")]
    pub country: String,

    /// Language sent with every query
    #[serde(default = "default_search_lang")]
    pub search_lang: String,
}

/// Configuration for the OpenAI-compatible language model endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL, e.g. `http://localhost:1234/v1`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token
    #[serde(default = "default_llm_api_key")]
    pub api_key: String,

    /// Model identifier
    #[serde(default)]
    pub model: Option<String>,

    /// Request timeout in seconds (local models can be slow)
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

/// Configuration for the press-release article scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleConfig {
    /// Site the search page and relative article links are resolved against
    #[serde(default = "default_article_base_url")]
    pub base_url: String,

    /// Maximum number of articles collected
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
}

/// Top-level configuration of a profile run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilerConfig {
    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub articles: ArticleConfig,

    /// User agent for browser and HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Delay enforced before each external network step
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Timeout for plain HTTP fetches
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_max_subpages() -> usize {
    5
}

fn default_max_total_chars() -> usize {
    25_000
}

fn default_page_load_timeout_secs() -> u64 {
    60
}

fn default_wait_timeout_secs() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_search_endpoint() -> String {
    "https://api.search.brave.com/res/v1/web/search".to_string()
}

fn default_country() -> String {
    "US".to_string()
}

fn default_search_lang() -> String {
    "en".to_string()
}

fn default_llm_api_key() -> String {
    "lm-studio".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    1160
}

fn default_article_base_url() -> String {
    "https://www.globenewswire.com".to_string()
}

fn default_max_articles() -> usize {
    3
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_delay_ms() -> u64 {
    3000
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            webdriver_url: default_webdriver_url(),
            max_subpages: default_max_subpages(),
            max_total_chars: default_max_total_chars(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
            headless: true,
            scoring_policy: ScoringPolicy::default(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            base_url: default_article_base_url(),
            max_articles: default_max_articles(),
        }
    }
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            search: SearchConfig {
                api_key: None,
                endpoint: default_search_endpoint(),
                country: default_country(),
                search_lang: default_search_lang(),
            },
            llm: LlmConfig {
                base_url: None,
                api_key: default_llm_api_key(),
                model: None,
                timeout_secs: default_llm_timeout_secs(),
            },
            articles: ArticleConfig::default(),
            user_agent: default_user_agent(),
            request_delay_ms: default_request_delay_ms(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl CrawlConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

impl SearchConfig {
    /// The API key, unless it is missing or a sample placeholder
    pub fn usable_key(&self) -> Option<&str> {
        let key = self.api_key.as_deref()?.trim();
        if key.is_empty() || PLACEHOLDER_KEYS.contains(&key) || self.endpoint.trim().is_empty() {
            return None;
        }
        Some(key)
    }
}

impl LlmConfig {
    /// Whether both endpoint and model are known
    pub fn is_configured(&self) -> bool {
        matches!(&self.base_url, Some(url) if !url.trim().is_empty())
            && matches!(&self.model, Some(model) if !model.trim().is_empty())
    }
}

impl ProfilerConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| ProfileError::Config(format!("{}: {}", path.display(), e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProfileError::Config(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        serde_json::from_str(json).map_err(|e| ProfileError::Config(e.to_string()))
    }

    /// Override settings from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("WEBDRIVER_URL") {
            self.crawl.webdriver_url = url;
        }
        if let Some(key) = var("BRAVE_SEARCH_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(endpoint) = var("BRAVE_SEARCH_ENDPOINT") {
            self.search.endpoint = endpoint;
        }
        if let Some(base_url) = var("LM_STUDIO_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(api_key) = var("LM_STUDIO_API_KEY") {
            self.llm.api_key = api_key;
        }
        if let Some(model) = var("LM_STUDIO_MODEL") {
            self.llm.model = Some(model);
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
