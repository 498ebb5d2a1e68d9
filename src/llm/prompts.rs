//! The three language-model calls of a profile run: the size pre-estimate,
//! article summaries and the final report synthesis.

use super::{ChatMessage, ChatModel, GenerationParams};
use crate::parsers::text::{truncate_chars, truncate_with_marker};
use crate::results::{AggregateDataset, Article, ArticleSummary, DatasetEntry};
use serde::{Deserialize, Serialize};
use url::Url;

pub const ESTIMATE_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 300,
    temperature: 0.3,
};

pub const SUMMARY_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 500,
    temperature: 0.5,
};

pub const SYNTHESIS_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 3800,
    temperature: 0.4,
};

const SUMMARY_INPUT_LIMIT: usize = 12_000;
const SUMMARY_MIN_CHARS: usize = 100;

const WEBSITE_LIMIT: usize = 15_000;
const SIZE_LIMIT: usize = 4_000;
const SUBREDDIT_LIMIT: usize = 4_000;
const SOCIAL_LIMIT: usize = 2_000;
const PROMPT_ARTICLES: usize = 3;
const ARTICLE_SNIPPET_CHARS: usize = 1_000;
const MIN_USABLE_SUMMARY: usize = 50;

/// Outcome of the final synthesis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Synthesis {
    Report { text: String },
    Failed { message: String, details: String },
}

impl Synthesis {
    pub fn report(&self) -> Option<&str> {
        match self {
            Synthesis::Report { text } => Some(text),
            Synthesis::Failed { .. } => None,
        }
    }
}

/// Email domain offered to the model and a note on where it came from
pub fn email_domain(company: &str, website: Option<&str>) -> (String, String) {
    let host = website.and_then(|site| {
        Url::parse(site)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    });
    match (website, host) {
        (Some(site), Some(host)) => (host, format!("derived from {}", site)),
        _ => {
            let guess: String = company
                .to_lowercase()
                .chars()
                .filter(|c| *c != ' ' && *c != '.')
                .collect();
            (
                format!("{}.com (guessed)", guess),
                "guessed from company name".to_string(),
            )
        }
    }
}

pub fn estimate_messages(company: &str, website: Option<&str>) -> Vec<ChatMessage> {
    let (domain, domain_source) = email_domain(company, website);
    let prompt = format!(
        "Using public information and general knowledge, give concise estimates for the company '{company}'.\n\
         Potential website: '{site}'.\n\n\
         Answer each point on its own line:\n\
         1. **Approximate Annual Revenue Range:** (e.g. <$1M, $1M-$10M, $10M-$50M, $50M-$250M, $250M-$1B, $1B+, or \"Revenue estimate unavailable\")\n\
         2. **Estimated Number of Employees Range:** (e.g. 1-10, 11-50, 51-200, 201-500, 501-1000, 1001-5000, 5000+, or \"Employee estimate unavailable\")\n\
         3. **Common Email Format Convention:** for the email domain '{domain}' ({domain_source}), the most likely naming convention \
         (e.g. firstname.lastname@{domain}, f.lastname@{domain}, firstname@{domain}), or \"Email format convention unknown or highly speculative\".\n\n\
         When a metric cannot be estimated reliably, say so for that metric. Give only the requested information.",
        company = company,
        site = website.unwrap_or("not provided"),
        domain = domain,
        domain_source = domain_source,
    );
    vec![
        ChatMessage::system(
            "You are an AI assistant providing company size estimations and typical email format conventions based on general public knowledge.",
        ),
        ChatMessage::user(prompt),
    ]
}

/// Revenue, headcount and email-format estimate for the dataset
pub async fn estimate_company(
    model: Option<&dyn ChatModel>,
    company: &str,
    website: Option<&str>,
) -> DatasetEntry {
    let Some(model) = model else {
        ::log::warn!("No language model configured, skipping estimates");
        return DatasetEntry::skipped("LLM client not configured");
    };

    ::log::info!("Requesting estimates for {} from {}", company, model.model());
    match model
        .complete(&estimate_messages(company, website), ESTIMATE_PARAMS)
        .await
    {
        Ok(text) => DatasetEntry::Text(text),
        Err(e) => {
            ::log::error!("Estimate request for {} failed: {}", company, e);
            DatasetEntry::failed("LLM estimation", e)
        }
    }
}

pub fn summary_messages(company: &str, article_text: &str) -> Vec<ChatMessage> {
    let text = if article_text.chars().count() > SUMMARY_INPUT_LIMIT {
        ::log::warn!(
            "Article text of {} chars truncated to {} for summarization",
            article_text.chars().count(),
            SUMMARY_INPUT_LIMIT
        );
        format!(
            "{}... [TRUNCATED FOR SUMMARIZATION]",
            truncate_chars(article_text, SUMMARY_INPUT_LIMIT)
        )
    } else {
        article_text.to_string()
    };

    let prompt = format!(
        "Summarize the following news article in about 150-250 words, focusing on how it relates to '{company}'.\n\
         Highlight what a sales team engaging this company should know:\n\
         - growth, new products or services, funding, expansion, key hires, financial results\n\
         - challenges, competitive shifts, regulation, areas where they may need solutions\n\
         - leadership changes and key personnel\n\
         - partnerships or acquisitions\n\
         - market position or sentiment\n\
         If '{company}' is only mentioned in passing, say so briefly. Prefer specific insights over generic statements.\n\n\
         Article Text:\n---\n{text}\n---\n\
         Concise Summary for Sales Team (focused on {company}):",
        company = company,
        text = text,
    );
    vec![
        ChatMessage::system(
            "You are an AI assistant specialized in accurately and concisely summarizing business news articles, extracting key insights relevant for sales professionals targeting a specific company.",
        ),
        ChatMessage::user(prompt),
    ]
}

/// Sales-focused summary of one article
pub async fn summarize_article(
    model: Option<&dyn ChatModel>,
    company: &str,
    article_text: &str,
) -> ArticleSummary {
    let Some(model) = model else {
        return ArticleSummary::Skipped("LLM client not available".to_string());
    };
    if article_text.trim().chars().count() < SUMMARY_MIN_CHARS {
        ::log::warn!("Skipping summarization of short article content");
        return ArticleSummary::Skipped(
            "Content too short or empty to summarize meaningfully".to_string(),
        );
    }

    match model
        .complete(&summary_messages(company, article_text), SUMMARY_PARAMS)
        .await
    {
        Ok(summary) => {
            ::log::info!("Article summary generated ({} chars)", summary.len());
            ArticleSummary::Summarized(summary)
        }
        Err(e) => {
            ::log::error!("Article summarization failed: {}", e);
            ArticleSummary::Failed(e.to_string())
        }
    }
}

fn limited(entry: &DatasetEntry, fallback: &str, limit: usize, marker: &str, label: &str) -> String {
    let text = entry.as_text().unwrap_or(fallback);
    let count = text.chars().count();
    if count > limit {
        ::log::warn!("{} truncated from {} to {} chars for the synthesis prompt", label, count, limit);
    }
    truncate_with_marker(text, limit, marker)
}

fn article_block(index: usize, article: &Article) -> String {
    let body = match article.summary.text() {
        Some(summary) if summary.chars().count() >= MIN_USABLE_SUMMARY => summary.to_string(),
        _ => {
            let snippet = if article.content.chars().count() > ARTICLE_SNIPPET_CHARS {
                format!("{}...", truncate_chars(&article.content, ARTICLE_SNIPPET_CHARS))
            } else {
                article.content.clone()
            };
            let snippet = if snippet.trim().is_empty() {
                "[Content snippet unavailable or summary failed]".to_string()
            } else {
                snippet
            };
            format!("(Summary failed or too short, using content snippet): {}", snippet)
        }
    };
    format!(
        "Article {}:\nTitle: {} ({})\nURL: {}\nSummary/Content Snippet:\n{}\n---",
        index + 1,
        article.title,
        article.date,
        article.url,
        body
    )
}

/// Prompt section listing at most three articles
pub fn articles_section(entry: &DatasetEntry) -> String {
    let articles = match entry {
        DatasetEntry::Articles(articles) if !articles.is_empty() => articles,
        _ => return "[No relevant press-release articles found or processed]".to_string(),
    };

    let mut blocks: Vec<String> = articles
        .iter()
        .take(PROMPT_ARTICLES)
        .enumerate()
        .map(|(index, article)| article_block(index, article))
        .collect();
    if articles.len() > PROMPT_ARTICLES {
        blocks.push("... [Additional articles truncated from prompt] ...".to_string());
    }
    blocks.join("\n")
}

pub fn synthesis_messages(
    company: &str,
    website: Option<&str>,
    dataset: &AggregateDataset,
) -> Vec<ChatMessage> {
    let (domain, domain_source) = email_domain(company, website);

    let estimates = dataset
        .llm_estimates
        .as_text()
        .unwrap_or("[Initial LLM estimation not provided or failed]");
    let website_text = limited(
        &dataset.website_content,
        "[Website content not gathered or unavailable]",
        WEBSITE_LIMIT,
        "[TRUNCATED WEBSITE CONTENT]",
        "Website content",
    );
    let news = dataset
        .news_snippets
        .as_text()
        .unwrap_or("[News search skipped, failed, or returned no results]");
    let size = limited(
        &dataset.size_estimate_snippets,
        "[Size search skipped, failed, or returned no relevant snippets]",
        SIZE_LIMIT,
        "[TRUNCATED SIZE SNIPPETS]",
        "Size snippets",
    );
    let subreddits = limited(
        &dataset.subreddits,
        "[Subreddit search skipped, failed, or returned no results]",
        SUBREDDIT_LIMIT,
        "[TRUNCATED SUBREDDIT DATA]",
        "Subreddit data",
    );
    let social = limited(
        &dataset.social_media_links,
        "[Social media link search not run, failed, or no results found]",
        SOCIAL_LIMIT,
        "[TRUNCATED SOCIAL MEDIA INFO]",
        "Social media info",
    );
    let articles = articles_section(&dataset.articles);

    let prompt = format!(
        "You are an expert AI Sales Intelligence Analyst writing a concise, actionable report for a Reddit advertising sales representative preparing to contact '{company}'.\n\
         Explain '{company}'s business, likely advertising needs and target audience, and how Reddit's advertising platform could help them.\n\
         Base the analysis on the data below. Do not invent information.\n\n\
         **Company Name:** {company}\n\
         **Potential Website (for context):** {site}\n\
         **Potential Email Domain (for contact ideas):** {domain} (Note: This domain was {domain_source})\n\n\
         **Provided Data for Analysis:**\n\n\
         --- Initial LLM Estimates (Revenue/Employees/Email Format) ---\n{estimates}\n--- End Initial LLM Estimates ---\n\n\
         --- Website Content Snippet (Homepage & Key Subpages - Plain Text) ---\n{website_text}\n--- End Website Content Snippet ---\n\n\
         --- News Snippets ---\n{news}\n--- End News Snippets ---\n\n\
         --- Web Snippets (Potential Size Indicators) ---\n{size}\n--- End Web Snippets ---\n\n\
         --- Subreddit Snippets (subreddit mentions and member counts from search results) ---\n{subreddits}\n--- End Subreddit Snippets ---\n\n\
         --- Social Media Links ---\n{social}\n--- End Social Media Links ---\n\n\
         --- Press-Release Articles (Summaries/Snippets, max 3 articles) ---\n{articles}\n--- End Press-Release Articles ---\n\n\
         **Report Sections Required (address each point concisely):**\n\n\
         1. **{company} Profile:** industry and primary business focus; overview of products, services and business model; \
         1-2 recent news insights a sales rep could use.\n\
         2. **Social Media Presence:** official profiles found in the website content or the social media links, with direct URLs per platform. \
         Say clearly when none were identified.\n\
         3. **{company} Size Estimate (Synthesized):** revenue and employee estimate combining the pre-estimate and size snippets; note conflicting or scarce data.\n\
         4. **Potential Decision Makers & Contact Info:** people named in the website content with marketing, sales or leadership titles. \
         List email or phone only when it appears next to that person in the website text; never guess.\n\
         5. **Sample Outreach Strategy for Reddit Advertising:** why '{company}' would benefit from Reddit; a pitch for adding Reddit to client campaigns if '{company}' is an agency; \
         2-3 subreddits from the subreddit snippets with member counts when given; a 3-4 sentence intro email; an SMS under 160 characters; a phone intro under 60 seconds.\n\
         6. **Marketing & Sales Context:** current marketing activities implied by the data; likely target audience; 2-3 Reddit benefits specific to '{company}'.\n\
         7. **Proposed Reddit Campaign Idea:** primary objective, target subreddits, creative approach, call to action.\n\
         8. **General Company Contact Information:** main address, general phone number, general email address and official website, only when found in the data.\n\n\
         **Output Format:** Use clear headings for sections 1-8. Stick to the provided data. When information for a point is missing, state \
         'Insufficient data provided for this point'.",
        company = company,
        site = website.unwrap_or("N/A"),
        domain = domain,
        domain_source = domain_source,
        estimates = estimates,
        website_text = website_text,
        news = news,
        size = size,
        subreddits = subreddits,
        social = social,
        articles = articles,
    );

    vec![
        ChatMessage::system(
            "You are an expert AI Sales Intelligence Analyst. Create a concise and actionable report for a Reddit advertising sales representative. Base your analysis on the provided data. DO NOT invent information or guess beyond interpreting the given data.",
        ),
        ChatMessage::user(prompt),
    ]
}

/// Final report from everything gathered
pub async fn synthesize(
    model: Option<&dyn ChatModel>,
    company: &str,
    website: Option<&str>,
    dataset: &AggregateDataset,
) -> Synthesis {
    let Some(model) = model else {
        return Synthesis::Failed {
            message: "LLM client not configured".to_string(),
            details: "No chat-completion endpoint and model were configured.".to_string(),
        };
    };

    let messages = synthesis_messages(company, website, dataset);
    ::log::info!(
        "Requesting report synthesis for {} from {} (~{} prompt chars)",
        company,
        model.model(),
        messages.iter().map(|m| m.content.len()).sum::<usize>()
    );
    match model.complete(&messages, SYNTHESIS_PARAMS).await {
        Ok(text) => Synthesis::Report { text },
        Err(e) => {
            ::log::error!("Report synthesis for {} failed: {}", company, e);
            Synthesis::Failed {
                message: "LLM analysis failed".to_string(),
                details: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed text and records every prompt it was given
    struct ScriptedModel {
        reply: Result<String, u16>,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn last_user_prompt(&self) -> String {
            let prompts = self.prompts.lock().unwrap();
            prompts.last().unwrap()[1].content.clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            messages: &[ChatMessage],
            _params: GenerationParams,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    body: "boom".to_string(),
                }),
            }
        }
    }

    fn article(title: &str, content: &str, summary: ArticleSummary) -> Article {
        Article {
            title: title.to_string(),
            url: format!("https://news.test/{}", title),
            date: "2024-01-02 10:00:00".to_string(),
            source: "Acme Corp".to_string(),
            content: content.to_string(),
            summary,
        }
    }

    #[test]
    fn test_email_domain_from_website_host() {
        let (domain, source) = email_domain("Acme", Some("https://www.acme.com"));
        assert_eq!(domain, "www.acme.com");
        assert_eq!(source, "derived from https://www.acme.com");
    }

    #[test]
    fn test_email_domain_guessed_from_name() {
        let (domain, source) = email_domain("Acme Widgets Inc.", None);
        assert_eq!(domain, "acmewidgetsinc.com (guessed)");
        assert_eq!(source, "guessed from company name");
    }

    #[tokio::test]
    async fn test_estimate_without_model_is_skipped() {
        let entry = estimate_company(None, "Acme", None).await;
        assert_eq!(
            entry,
            DatasetEntry::Placeholder("[Skipped - LLM client not configured]".to_string())
        );
    }

    #[tokio::test]
    async fn test_estimate_failure_is_placeholder() {
        let model = ScriptedModel::failing(500);
        let entry = estimate_company(Some(&model), "Acme", None).await;
        match entry {
            DatasetEntry::Placeholder(text) => assert!(text.starts_with("[LLM estimation failed:")),
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_estimate_prompt_mentions_domain() {
        let model = ScriptedModel::replying("1. $1M-$10M");
        let entry = estimate_company(Some(&model), "Acme", Some("https://acme.com")).await;
        assert_eq!(entry, DatasetEntry::Text("1. $1M-$10M".to_string()));
        assert!(model.last_user_prompt().contains("firstname.lastname@acme.com"));
    }

    #[tokio::test]
    async fn test_short_article_is_not_summarized() {
        let model = ScriptedModel::replying("summary");
        let summary = summarize_article(Some(&model), "Acme", "   too short   ").await;
        assert!(matches!(summary, ArticleSummary::Skipped(_)));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_long_article_is_truncated_for_summary() {
        let model = ScriptedModel::replying("Acme grew.");
        let text = "word ".repeat(5_000);
        let summary = summarize_article(Some(&model), "Acme", &text).await;

        assert_eq!(summary, ArticleSummary::Summarized("Acme grew.".to_string()));
        let prompt = model.last_user_prompt();
        assert!(prompt.contains("... [TRUNCATED FOR SUMMARIZATION]"));
        assert!(prompt.len() < text.len());
    }

    #[tokio::test]
    async fn test_summary_failure_is_recorded() {
        let model = ScriptedModel::failing(503);
        let summary = summarize_article(Some(&model), "Acme", &"x".repeat(200)).await;
        assert!(matches!(summary, ArticleSummary::Failed(reason) if reason.contains("503")));
    }

    #[test]
    fn test_articles_section_uses_snippet_for_missing_summary() {
        let long_summary = "Acme announced a new product line aimed at enterprise buyers.";
        let entry = DatasetEntry::Articles(vec![
            article("one", "body one", ArticleSummary::Summarized(long_summary.to_string())),
            article("two", &"c".repeat(1_500), ArticleSummary::Failed("boom".to_string())),
            article("three", "", ArticleSummary::Summarized("short".to_string())),
            article("four", "body four", ArticleSummary::Skipped("no client".to_string())),
        ]);

        let section = articles_section(&entry);
        assert!(section.starts_with("Article 1:\nTitle: one (2024-01-02 10:00:00)\nURL: https://news.test/one"));
        assert!(section.contains(long_summary));
        assert!(section.contains(&format!(
            "(Summary failed or too short, using content snippet): {}...",
            "c".repeat(1_000)
        )));
        assert!(section.contains("[Content snippet unavailable or summary failed]"));
        assert!(!section.contains("Article 4:"));
        assert!(section.ends_with("... [Additional articles truncated from prompt] ..."));
    }

    #[test]
    fn test_articles_section_placeholder() {
        let entry = DatasetEntry::skipped("Article search not run");
        assert!(articles_section(&entry).starts_with("[No relevant"));
        assert!(articles_section(&DatasetEntry::Articles(Vec::new())).starts_with("[No relevant"));
    }

    #[test]
    fn test_synthesis_prompt_truncates_long_sections() {
        let mut dataset = AggregateDataset::default();
        dataset.website_content = DatasetEntry::Text("w".repeat(20_000));
        dataset.social_media_links = DatasetEntry::Text("s".repeat(3_000));

        let messages = synthesis_messages("Acme", Some("https://acme.com"), &dataset);
        let prompt = &messages[1].content;
        assert!(prompt.contains(&format!("{}\n... [TRUNCATED WEBSITE CONTENT]", "w".repeat(15_000))));
        assert!(!prompt.contains(&"w".repeat(15_001)));
        assert!(prompt.contains("... [TRUNCATED SOCIAL MEDIA INFO]"));
        assert!(prompt.contains("[Skipped - Search disabled or failed]"));
        assert!(prompt.contains("**Potential Email Domain (for contact ideas):** acme.com"));
    }

    #[tokio::test]
    async fn test_synthesize_outcomes() {
        let dataset = AggregateDataset::default();

        let ok = ScriptedModel::replying("# Report");
        let report = synthesize(Some(&ok), "Acme", None, &dataset).await;
        assert_eq!(report.report(), Some("# Report"));

        let failing = ScriptedModel::failing(500);
        match synthesize(Some(&failing), "Acme", None, &dataset).await {
            Synthesis::Failed { message, details } => {
                assert_eq!(message, "LLM analysis failed");
                assert!(details.contains("500"));
            }
            other => panic!("unexpected synthesis {:?}", other),
        }

        assert!(matches!(
            synthesize(None, "Acme", None, &dataset).await,
            Synthesis::Failed { .. }
        ));
    }
}
