use serde::{Deserialize, Serialize};

/// One page captured during a site crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedPage {
    /// URL the page was loaded from
    pub url: String,

    /// Resolved priority, `None` for the homepage
    pub priority: Option<usize>,

    /// Extracted text content
    pub text: String,
}

impl ScrapedPage {
    pub fn homepage(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority: None,
            text: text.into(),
        }
    }

    pub fn subpage(url: impl Into<String>, priority: usize, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority: Some(priority),
            text: text.into(),
        }
    }

    /// The page as a labeled block of the combined crawl text
    pub fn section(&self) -> String {
        match self.priority {
            None => format!("--- Homepage: {} ---\n{}\n\n", self.url, self.text),
            Some(rank) => format!("\n--- Subpage (P{}): {} ---\n{}\n\n", rank, self.url, self.text),
        }
    }
}

/// Outcome of a successful site crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    /// URL the crawl started from
    pub base_url: String,

    /// Homepage first, then subpages in traversal order
    pub pages: Vec<ScrapedPage>,

    /// Labeled sections of every page, capped at the crawl's character budget
    pub text: String,
}

impl CrawlReport {
    pub fn subpage_count(&self) -> usize {
        self.pages.iter().filter(|page| page.priority.is_some()).count()
    }
}

/// Outcome of summarizing a press-release article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum ArticleSummary {
    Summarized(String),
    Skipped(String),
    Failed(String),
}

impl ArticleSummary {
    /// The summary text, when one was produced
    pub fn text(&self) -> Option<&str> {
        match self {
            ArticleSummary::Summarized(text) => Some(text),
            _ => None,
        }
    }
}

/// A press-release article with its retrieved content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    /// `%Y-%m-%d %H:%M:%S` when the listing date could be parsed, raw text otherwise
    pub date: String,
    pub source: String,
    pub content: String,
    pub summary: ArticleSummary,
}

/// Value stored under one key of the aggregate dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DatasetEntry {
    /// Text gathered by the step
    Text(String),
    /// Articles gathered by the step
    Articles(Vec<Article>),
    /// The step was skipped or failed
    Placeholder(String),
}

impl DatasetEntry {
    pub fn skipped(reason: &str) -> Self {
        DatasetEntry::Placeholder(format!("[Skipped - {}]", reason))
    }

    pub fn failed(step: &str, reason: impl std::fmt::Display) -> Self {
        DatasetEntry::Placeholder(format!("[{} failed: {}]", step, reason))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, DatasetEntry::Placeholder(_))
    }

    /// Text form used when the entry is fed into a prompt
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DatasetEntry::Text(text) | DatasetEntry::Placeholder(text) => Some(text),
            DatasetEntry::Articles(_) => None,
        }
    }
}

/// Everything gathered about one prospect during a run.
///
/// Every field always holds a value; steps that did not run or failed leave a
/// placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateDataset {
    pub website_content: DatasetEntry,
    pub llm_estimates: DatasetEntry,
    pub news_snippets: DatasetEntry,
    pub size_estimate_snippets: DatasetEntry,
    pub subreddits: DatasetEntry,
    pub social_media_links: DatasetEntry,
    pub articles: DatasetEntry,
}

impl Default for AggregateDataset {
    fn default() -> Self {
        Self {
            website_content: DatasetEntry::skipped("Domain not confirmed or scraping disabled/failed"),
            llm_estimates: DatasetEntry::skipped("LLM client issue or task skipped"),
            news_snippets: DatasetEntry::skipped("Search disabled or failed"),
            size_estimate_snippets: DatasetEntry::skipped("Search disabled or failed"),
            subreddits: DatasetEntry::skipped("Search disabled or failed"),
            social_media_links: DatasetEntry::skipped("Social media link search not run or no results"),
            articles: DatasetEntry::skipped("Article search not run"),
        }
    }
}

impl AggregateDataset {
    /// Every entry keyed by its dataset name, in step order
    pub fn entries(&self) -> [(&'static str, &DatasetEntry); 7] {
        [
            ("llm_estimates", &self.llm_estimates),
            ("website_content", &self.website_content),
            ("news_snippets", &self.news_snippets),
            ("size_estimate_snippets", &self.size_estimate_snippets),
            ("subreddits", &self.subreddits),
            ("social_media_links", &self.social_media_links),
            ("articles", &self.articles),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_labels() {
        let home = ScrapedPage::homepage("https://example.com", "Welcome");
        assert_eq!(home.section(), "--- Homepage: https://example.com ---\nWelcome\n\n");

        let sub = ScrapedPage::subpage("https://example.com/about", 0, "About us");
        assert_eq!(
            sub.section(),
            "\n--- Subpage (P0): https://example.com/about ---\nAbout us\n\n"
        );
    }

    #[test]
    fn test_default_dataset_is_all_placeholders() {
        let dataset = AggregateDataset::default();
        assert!(dataset.entries().iter().all(|(_, entry)| entry.is_placeholder()));
    }

    #[test]
    fn test_dataset_serializes_every_key() {
        let mut dataset = AggregateDataset::default();
        dataset.website_content = DatasetEntry::Text("site".to_string());
        let value = serde_json::to_value(&dataset).unwrap();
        for (key, _) in dataset.entries() {
            assert!(value.get(key).is_some(), "{}", key);
        }
        assert_eq!(value["website_content"]["kind"], "text");
        assert_eq!(value["articles"]["kind"], "placeholder");
    }

    #[test]
    fn test_failed_placeholder_format() {
        let entry = DatasetEntry::failed("Website scraping", "homepage body timeout");
        assert_eq!(
            entry,
            DatasetEntry::Placeholder("[Website scraping failed: homepage body timeout]".to_string())
        );
    }
}
