use super::normalize::normalize_body;
use super::{SearchOutcome, SearchQuery, WebSearch};
use crate::config::SearchConfig;
use crate::error::SearchError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};

/// Client for the Brave web search API
#[derive(Debug, Clone)]
pub struct BraveClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    user_agent: String,
}

impl BraveClient {
    /// Client for a usable configuration, `SearchError::NotConfigured` otherwise
    pub fn from_config(
        config: &SearchConfig,
        http: reqwest::Client,
        user_agent: &str,
    ) -> Result<Self, SearchError> {
        let api_key = config.usable_key().ok_or(SearchError::NotConfigured)?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: api_key.to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    /// Run a query and return the raw response body
    pub async fn fetch_raw(&self, query: &SearchQuery) -> Result<String, SearchError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.query.clone()),
            ("count", query.count.to_string()),
        ];
        params.extend(
            query
                .extra_params
                .iter()
                .map(|(name, value)| (name.as_str(), value.clone())),
        );

        ::log::info!("Querying search API: {} (count {})", query.query, query.count);
        let response = self
            .http
            .get(&self.endpoint)
            .query(&params)
            .header(ACCEPT, "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl WebSearch for BraveClient {
    async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        match self.fetch_raw(query).await {
            Ok(body) => normalize_body(&body, &query.query),
            Err(e) => {
                ::log::error!("Search for '{}' failed: {}", query.query, e);
                SearchOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        }
    }
}
