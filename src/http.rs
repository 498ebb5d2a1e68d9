//! Plain HTTP session shared by the non-browser steps of one run

use crate::error::FetchError;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use url::Url;

/// A reqwest client carrying the run's user agent and timeout.
///
/// Created at the start of a run and dropped with it; cloning shares the
/// connection pool.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: reqwest::Client,
}

impl HttpSession {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, value);
        } else {
            ::log::warn!("Ignoring user agent with invalid header characters");
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// The underlying client, for callers that build their own requests
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET a page and return its body, failing on any non-success status
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get_page(url).await.map(|(_, body)| body)
    }

    /// Like [`get_text`](Self::get_text), also returning the URL reached after redirects
    pub async fn get_page(&self, url: &str) -> Result<(Url, String), FetchError> {
        let url = Url::parse(url)?;
        ::log::debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        Ok((final_url, response.text().await?))
    }
}
