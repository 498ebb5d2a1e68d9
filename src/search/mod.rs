//! Web search: the API client, the response normalizer and the query adapters
//! built on top of them.

pub mod adapters;
pub mod client;
pub mod normalize;

pub use client::BraveClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The flat shape every search result is normalized into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub title: String,
    pub description: String,
    pub url: String,
    pub provider: String,
    pub date_published: String,
}

/// Part of the response the records were taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    News,
    Web,
    Discussions,
    Results,
    Hits,
    Mixed,
}

impl ResultSource {
    pub fn key(&self) -> &'static str {
        match self {
            ResultSource::News => "news",
            ResultSource::Web => "web",
            ResultSource::Discussions => "discussions",
            ResultSource::Results => "results",
            ResultSource::Hits => "hits",
            ResultSource::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    /// Result-count hint
    pub count: u32,
    pub extra_params: Vec<(String, String)>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, count: u32) -> Self {
        Self {
            query: query.into(),
            count,
            extra_params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.extra_params.push((name.to_string(), value.to_string()));
        self
    }
}

/// Result of one search.
///
/// An empty but well-formed response is a `Success` with no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Success {
        records: Vec<SearchRecord>,
        /// Branch of the response the records came from
        source: Option<ResultSource>,
        /// Diagnostic for empty results
        message: Option<String>,
    },
    Failure {
        reason: String,
    },
}

impl SearchOutcome {
    pub fn empty(message: impl Into<String>) -> Self {
        SearchOutcome::Success {
            records: Vec::new(),
            source: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success { .. })
    }

    pub fn records(&self) -> &[SearchRecord] {
        match self {
            SearchOutcome::Success { records, .. } => records,
            SearchOutcome::Failure { .. } => &[],
        }
    }
}

/// A search backend
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> SearchOutcome;
}
