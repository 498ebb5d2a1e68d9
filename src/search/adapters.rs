//! Query builders that feed the search normalizer and post-filter its records
//! into text blocks for the aggregate dataset.

use super::{SearchOutcome, SearchQuery, SearchRecord, WebSearch};
use crate::config::SearchConfig;
use crate::results::DatasetEntry;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const NEWS_COUNT: u32 = 7;
const SIZE_COUNT: u32 = 5;
const SUBREDDIT_COUNT: u32 = 10;
const MAX_QUERY_LEN: usize = 500;

const SIZE_KEYWORDS: [&str; 11] = [
    "revenue", "employees", "$", "€", "£", "million", "billion", "headcount", "workforce",
    "staff", "team size",
];

const REDDIT_KEYWORDS: [&str; 7] = [
    "reddit", "subreddit", "r/", "community", "members", "subscribers", "forum",
];

static SUBREDDIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"r/([a-zA-Z0-9_]+(?:/[a-zA-Z0-9_]+)?)").unwrap()
});

static MEMBER_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\d{1,3}(?:,\d{3})*|\d+)(?:\.\d+)??\s*[kKmM]?\b\s*(?:members|subscribers|readers|users|followers|people\s+online|active\s+users|currently\s+viewing)",
    )
    .unwrap()
});

/// The three search consumers of a run, sharing one backend and market
pub struct SearchAdapters<'a> {
    search: &'a dyn WebSearch,
    country: String,
    search_lang: String,
}

impl<'a> SearchAdapters<'a> {
    pub fn new(search: &'a dyn WebSearch, config: &SearchConfig) -> Self {
        Self {
            search,
            country: config.country.clone(),
            search_lang: config.search_lang.clone(),
        }
    }

    fn query(&self, text: String, count: u32) -> SearchQuery {
        SearchQuery::new(text, count)
            .with_param("country", &self.country)
            .with_param("search_lang", &self.search_lang)
    }

    /// Recent news about the company
    pub async fn news(&self, company: &str) -> DatasetEntry {
        ::log::info!("Searching news for: {}", company);
        let query = self.query(news_query(company), NEWS_COUNT);

        match self.search.search(&query).await {
            SearchOutcome::Success { records, .. } if !records.is_empty() => {
                ::log::info!("Found {} news snippets", records.len());
                DatasetEntry::Text(records.iter().map(format_news).collect::<Vec<_>>().join("\n"))
            }
            SearchOutcome::Success { .. } => {
                ::log::info!("No news results found for '{}'", company);
                DatasetEntry::Placeholder("[No relevant news results found via web search]".to_string())
            }
            SearchOutcome::Failure { reason } => {
                ::log::error!("News search for {} failed: {}", company, reason);
                DatasetEntry::failed("News search", reason)
            }
        }
    }

    /// Snippets that mention revenue or headcount
    pub async fn size_estimates(&self, company: &str) -> DatasetEntry {
        ::log::info!("Searching size data for: {}", company);
        let query = self.query(size_query(company), SIZE_COUNT);

        match self.search.search(&query).await {
            SearchOutcome::Success { records, .. } if !records.is_empty() => {
                let snippets: Vec<String> = records
                    .iter()
                    .filter(|r| mentions_size(r))
                    .map(format_size)
                    .collect();
                if snippets.is_empty() {
                    ::log::info!("No snippets containing size keywords");
                    return DatasetEntry::Placeholder(
                        "[No relevant snippets found via web search for size data]".to_string(),
                    );
                }
                ::log::info!("Found {} snippets with size data", snippets.len());
                DatasetEntry::Text(snippets.join("\n"))
            }
            SearchOutcome::Success { .. } => DatasetEntry::Placeholder(
                "[No web results found via web search for size data]".to_string(),
            ),
            SearchOutcome::Failure { reason } => {
                ::log::error!("Size search for {} failed: {}", company, reason);
                DatasetEntry::failed("Web search for size data", reason)
            }
        }
    }

    /// Subreddits mentioned alongside the company, with member counts when visible
    pub async fn subreddits(&self, company: &str, topic: Option<&str>) -> DatasetEntry {
        ::log::info!(
            "Searching relevant subreddits for: {} (Topic: '{}')",
            company,
            topic.unwrap_or("General")
        );
        let query = self.query(subreddit_query(company, topic), SUBREDDIT_COUNT);

        match self.search.search(&query).await {
            SearchOutcome::Success { records, .. } if !records.is_empty() => {
                let found: Vec<String> = records
                    .iter()
                    .filter(|r| {
                        let related = is_reddit_related(r);
                        if !related {
                            ::log::debug!("Skipping result not related to Reddit: {}", r.url);
                        }
                        related
                    })
                    .filter_map(format_subreddit_mention)
                    .collect();
                if found.is_empty() {
                    return DatasetEntry::Placeholder(
                        "[No relevant snippets found with subreddit information via web search]"
                            .to_string(),
                    );
                }
                ::log::info!("Found {} snippets with subreddit information", found.len());
                DatasetEntry::Text(found.join("\n"))
            }
            SearchOutcome::Success { .. } => DatasetEntry::Placeholder(
                "[No web results found via web search for this subreddit query]".to_string(),
            ),
            SearchOutcome::Failure { reason } => {
                ::log::error!("Subreddit search for {} failed: {}", company, reason);
                DatasetEntry::failed("Web search for subreddits", reason)
            }
        }
    }
}

fn news_query(company: &str) -> String {
    format!("{} news", company)
}

fn size_query(company: &str) -> String {
    format!(
        "\"{0}\" annual revenue employees OR \"{0}\" company size OR \"{0}\" number of employees",
        company
    )
}

fn subreddit_query(company: &str, topic: Option<&str>) -> String {
    let mut parts = vec![
        format!("site:reddit.com \"{}\" relevant subreddits", company),
        format!("site:reddit.com subreddits for \"{}\" audience", company),
    ];
    match topic.filter(|t| !t.trim().is_empty()) {
        Some(topic) => {
            parts.push(format!("site:reddit.com \"{}\" subreddits discussion", topic));
            parts.push(format!("site:reddit.com best subreddits for \"{}\" users", topic));
            parts.push(format!("site:reddit.com \"{}\" \"{}\" community", company, topic));
        }
        None => {
            parts.push(format!("site:reddit.com \"{}\" related communities", company));
            parts.push(format!("site:reddit.com discuss \"{}\"", company));
        }
    }

    let query = parts.join(" OR ");
    if query.len() > MAX_QUERY_LEN {
        let truncated = parts[..3].join(" OR ");
        ::log::warn!("Subreddit search query was too long, truncated to: {}", truncated);
        return truncated;
    }
    query
}

fn format_news(record: &SearchRecord) -> String {
    let date = if record.date_published.is_empty() {
        "Date N/A"
    } else {
        record.date_published.as_str()
    };
    format!(
        "Title: {}\n  Source: {} ({})\n  Description: {}\n  URL: {}\n---\n",
        record.title, record.provider, date, record.description, record.url
    )
}

fn mentions_size(record: &SearchRecord) -> bool {
    let description = record.description.to_lowercase();
    !description.is_empty() && SIZE_KEYWORDS.iter().any(|k| description.contains(k))
}

fn format_size(record: &SearchRecord) -> String {
    format!(
        "Title: {}\nURL: {} (Source: {})\nSnippet: {}\n---\n",
        record.title, record.url, record.provider, record.description
    )
}

fn is_reddit_related(record: &SearchRecord) -> bool {
    let title = record.title.to_lowercase();
    let description = record.description.to_lowercase();
    record.url.to_lowercase().contains("reddit.com")
        || record.provider.to_lowercase().contains("reddit.com")
        || REDDIT_KEYWORDS
            .iter()
            .any(|k| title.contains(k) || description.contains(k))
}

/// `r/<name>` mentions, taken from the first of description, title and URL that has any
fn subreddit_mentions(record: &SearchRecord) -> BTreeSet<String> {
    [&record.description, &record.title, &record.url]
        .into_iter()
        .map(|text| {
            SUBREDDIT_RE
                .captures_iter(text)
                .map(|caps| format!("r/{}", &caps[1]))
                .collect::<BTreeSet<_>>()
        })
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// Member-count phrases, taken from the description or else the title
fn member_counts(record: &SearchRecord) -> BTreeSet<String> {
    [&record.description, &record.title]
        .into_iter()
        .map(|text| {
            MEMBER_COUNT_RE
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect::<BTreeSet<_>>()
        })
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

fn format_subreddit_mention(record: &SearchRecord) -> Option<String> {
    let subreddits = subreddit_mentions(record);
    if subreddits.is_empty() {
        return None;
    }
    let counts = member_counts(record);

    let mut parts = vec![
        format!("Source Title: {}", record.title),
        format!("Source URL: {} (Provider: {})", record.url, record.provider),
        format!("Relevant Snippet: \"{}\"", record.description),
        format!(
            "  Mentioned Subreddit(s) in snippet/title/URL: {}",
            subreddits.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
    ];
    if counts.is_empty() {
        parts.push("  Potential Member Count(s) in Snippet/Title: Not clearly identified.".to_string());
    } else {
        parts.push(format!(
            "  Potential Member Count(s) in Snippet/Title: {}",
            counts.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
        if let ([subreddit], [count]) = (
            subreddits.iter().collect::<Vec<_>>().as_slice(),
            counts.iter().collect::<Vec<_>>().as_slice(),
        ) {
            parts.push(format!("  Possible Association: {} with {}", subreddit, count));
        }
    }
    parts.push("---\n".to_string());
    Some(parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed outcome and remembers the queries it saw
    struct CannedSearch {
        outcome: SearchOutcome,
        seen: Mutex<Vec<SearchQuery>>,
    }

    impl CannedSearch {
        fn new(outcome: SearchOutcome) -> Self {
            Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn with_records(records: Vec<SearchRecord>) -> Self {
            Self::new(SearchOutcome::Success {
                records,
                source: None,
                message: None,
            })
        }
    }

    #[async_trait]
    impl WebSearch for CannedSearch {
        async fn search(&self, query: &SearchQuery) -> SearchOutcome {
            self.seen.lock().unwrap().push(query.clone());
            self.outcome.clone()
        }
    }

    fn record(title: &str, description: &str, url: &str, provider: &str) -> SearchRecord {
        SearchRecord {
            title: title.to_string(),
            description: description.to_string(),
            url: url.to_string(),
            provider: provider.to_string(),
            date_published: String::new(),
        }
    }

    fn config() -> SearchConfig {
        SearchConfig {
            country: "US".to_string(),
            search_lang: "en".to_string(),
            ..SearchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_news_query_and_format() {
        let search = CannedSearch::with_records(vec![record(
            "Acme launches",
            "New product",
            "https://n.test/1",
            "Wire",
        )]);
        let entry = SearchAdapters::new(&search, &config()).news("Acme").await;

        let seen = search.seen.lock().unwrap();
        assert_eq!(seen[0].query, "Acme news");
        assert_eq!(seen[0].count, 7);
        assert!(seen[0].extra_params.contains(&("search_lang".to_string(), "en".to_string())));
        assert_eq!(
            entry,
            DatasetEntry::Text(
                "Title: Acme launches\n  Source: Wire (Date N/A)\n  Description: New product\n  URL: https://n.test/1\n---\n"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_news_failure_and_empty() {
        let failing = CannedSearch::new(SearchOutcome::Failure {
            reason: "status 500".to_string(),
        });
        let entry = SearchAdapters::new(&failing, &config()).news("Acme").await;
        assert_eq!(
            entry,
            DatasetEntry::Placeholder("[News search failed: status 500]".to_string())
        );

        let empty = CannedSearch::new(SearchOutcome::empty("nothing"));
        let entry = SearchAdapters::new(&empty, &config()).news("Acme").await;
        assert!(entry.is_placeholder());
    }

    #[tokio::test]
    async fn test_size_estimates_keep_keyword_snippets() {
        let search = CannedSearch::with_records(vec![
            record("Acme profile", "Acme has 250 employees", "https://a.test", "A"),
            record("Acme blog", "Our new logo", "https://b.test", "B"),
            record("Acme revenue", "Revenue of $12 Million", "https://c.test", "C"),
        ]);
        let entry = SearchAdapters::new(&search, &config()).size_estimates("Acme").await;

        let seen = search.seen.lock().unwrap();
        assert_eq!(
            seen[0].query,
            "\"Acme\" annual revenue employees OR \"Acme\" company size OR \"Acme\" number of employees"
        );
        assert_eq!(seen[0].count, 5);

        let text = entry.as_text().unwrap();
        assert!(text.contains("Acme profile"));
        assert!(text.contains("Acme revenue"));
        assert!(!text.contains("Acme blog"));
    }

    #[tokio::test]
    async fn test_size_estimates_without_keywords() {
        let search = CannedSearch::with_records(vec![record("x", "nothing useful", "https://x.test", "X")]);
        let entry = SearchAdapters::new(&search, &config()).size_estimates("Acme").await;
        assert_eq!(
            entry,
            DatasetEntry::Placeholder(
                "[No relevant snippets found via web search for size data]".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_subreddit_association() {
        let search = CannedSearch::with_records(vec![
            record(
                "Acme fans",
                "Join r/acmefans, 12k members discuss the product",
                "https://www.reddit.com/r/acmefans",
                "reddit.com",
            ),
            record("Unrelated", "Nothing here", "https://other.test", "Other"),
            record(
                "Community thread",
                "Talk about Acme",
                "https://forum.test/t/1",
                "Forum",
            ),
        ]);
        let entry = SearchAdapters::new(&search, &config())
            .subreddits("Acme", None)
            .await;
        let text = entry.as_text().unwrap();

        assert!(text.contains("Mentioned Subreddit(s) in snippet/title/URL: r/acmefans"));
        assert!(text.contains("Potential Member Count(s) in Snippet/Title: 12k members"));
        assert!(text.contains("Possible Association: r/acmefans with 12k members"));
        assert!(!text.contains("Unrelated"));
        // related but no r/ mention anywhere
        assert!(!text.contains("Community thread"));
    }

    #[test]
    fn test_member_count_phrases() {
        let rec = record("t", "1.2m subscribers and 3,400 people online", "", "");
        let counts: Vec<String> = member_counts(&rec).into_iter().collect();
        assert_eq!(counts, vec!["1.2m subscribers", "3,400 people online"]);
    }

    #[test]
    fn test_subreddit_mentions_fall_back_to_url() {
        let rec = record("Thread", "no mention", "https://reddit.com/r/rust/comments", "");
        let found: Vec<String> = subreddit_mentions(&rec).into_iter().collect();
        assert_eq!(found, vec!["r/rust/comments"]);
    }

    #[test]
    fn test_long_subreddit_query_is_truncated() {
        let company = "A".repeat(120);
        let query = subreddit_query(&company, None);
        assert_eq!(query.matches(" OR ").count(), 2);

        let short = subreddit_query("Acme", Some("robotics"));
        assert_eq!(short.matches(" OR ").count(), 4);
        assert!(short.contains("\"robotics\" subreddits discussion"));
    }
}
