//! Error types for every failure domain of a profile run

use thiserror::Error;

/// Failures of the website crawl.
///
/// Only the variants produced before the homepage is captured are fatal to the
/// crawl; subpage navigation failures are logged and skipped by the crawler.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// No WebDriver server accepted a new session
    #[error("browser session could not be started: {0}")]
    SessionStart(String),

    /// Scratch profile directory could not be created
    #[error("browser profile directory could not be created: {0}")]
    ProfileDir(#[from] std::io::Error),

    /// The base URL could not be turned into a navigable URL
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// The page did not expose a body before the wait timeout
    #[error("timed out waiting for page body at {0}")]
    Timeout(String),

    /// The page was loaded but had no body element
    #[error("page body not found at {0}")]
    MissingBody(String),

    /// Any other driver failure
    #[error("browser error at {url}: {message}")]
    Driver { url: String, message: String },
}

/// Failures of the search API transport.
///
/// An empty but well-formed response is not an error.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No API key or endpoint configured
    #[error("search API is not configured")]
    NotConfigured,

    /// Network failure
    #[error("transport error reaching search API: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("search API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not JSON
    #[error("JSON decoding failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures of the language-model collaborator
#[derive(Debug, Error)]
pub enum LlmError {
    /// No endpoint or model configured
    #[error("language model client is not configured")]
    NotConfigured,

    /// The endpoint could not be reached
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// The endpoint answered with an error status
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// The endpoint answered without any generated text
    #[error("empty response (finish reason: {finish_reason})")]
    EmptyResponse { finish_reason: String },
}

/// Failures of plain HTML page fetches
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Request did not complete in time
    #[error("timeout retrieving {0}")]
    Timeout(String),

    /// Any other transport failure
    #[error("request error: {0}")]
    Request(reqwest::Error),

    /// Non-success HTTP status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            FetchError::Timeout(url)
        } else {
            FetchError::Request(err)
        }
    }
}

/// Errors that prevent a profile run from starting at all
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Identifier was blank
    #[error("input identifier cannot be empty")]
    EmptyIdentifier,

    /// Per-run HTTP client could not be built
    #[error("HTTP client could not be created: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration file problem
    #[error("configuration error: {0}")]
    Config(String),
}
