//! Sequences every gathering step of a profile run into one dataset.
//!
//! Each step runs behind its own failure boundary: a failing collaborator
//! leaves a placeholder under its key and the run carries on.

use crate::articles::{ArticleSource, PressReleaseScraper};
use crate::config::{ProfilerConfig, SearchConfig};
use crate::crawlers::{SiteScraper, WebDriverScraper};
use crate::error::ProfileError;
use crate::http::HttpSession;
use crate::llm::prompts::{Synthesis, estimate_company, synthesize};
use crate::llm::{ChatModel, OpenAiCompatClient};
use crate::results::{AggregateDataset, DatasetEntry};
use crate::search::adapters::SearchAdapters;
use crate::search::{BraveClient, WebSearch};
use crate::social::{HomepageSocialScraper, SocialLinkFinder};
use crate::utils::{Prospect, identify};
use serde::Serialize;
use std::time::Duration;

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub company_name: String,
    pub domain: Option<String>,
    pub dataset: AggregateDataset,
    pub synthesis: Synthesis,
}

/// Builder and runner for profile runs.
///
/// Collaborators left unset are treated as unavailable and their steps are
/// recorded as skipped.
pub struct Profiler {
    model: Option<Box<dyn ChatModel>>,
    site: Option<Box<dyn SiteScraper>>,
    search: Option<Box<dyn WebSearch>>,
    search_config: SearchConfig,
    social: Option<Box<dyn SocialLinkFinder>>,
    articles: Option<Box<dyn ArticleSource>>,
    subreddit_topic: Option<String>,
    request_delay: Duration,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    /// A profiler with no collaborators and no delay
    pub fn new() -> Self {
        Self {
            model: None,
            site: None,
            search: None,
            search_config: ProfilerConfig::default().search,
            social: None,
            articles: None,
            subreddit_topic: None,
            request_delay: Duration::ZERO,
        }
    }

    /// Wire the real collaborators for every configured service
    pub fn from_config(config: &ProfilerConfig) -> Result<Self, ProfileError> {
        let http = HttpSession::new(&config.user_agent, config.http_timeout())?;

        let mut profiler = Self::new()
            .with_request_delay(config.request_delay())
            .with_social(HomepageSocialScraper::new(http.clone()));

        match OpenAiCompatClient::from_config(&config.llm) {
            Ok(client) => {
                ::log::info!("Using model {} at {}", client.model(), client.base_url());
                profiler = profiler.with_model(client);
            }
            Err(e) => ::log::warn!("Language model unavailable: {}", e),
        }

        if config.crawl.disabled {
            ::log::info!("Website crawling disabled");
        } else {
            profiler = profiler.with_site_scraper(WebDriverScraper::new(
                config.crawl.clone(),
                config.user_agent.as_str(),
            ));
        }

        match BraveClient::from_config(&config.search, http.client().clone(), &config.user_agent) {
            Ok(client) => profiler = profiler.with_search(client, config.search.clone()),
            Err(e) => ::log::warn!("Search disabled: {}", e),
        }

        let articles = PressReleaseScraper::new(http, &config.articles, config.request_delay())
            .map_err(|e| ProfileError::Config(format!("articles.base_url: {}", e)))?;
        Ok(profiler.with_articles(articles))
    }

    pub fn with_model(mut self, model: impl ChatModel + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    pub fn with_site_scraper(mut self, site: impl SiteScraper + 'static) -> Self {
        self.site = Some(Box::new(site));
        self
    }

    pub fn with_search(mut self, search: impl WebSearch + 'static, config: SearchConfig) -> Self {
        self.search = Some(Box::new(search));
        self.search_config = config;
        self
    }

    pub fn with_social(mut self, social: impl SocialLinkFinder + 'static) -> Self {
        self.social = Some(Box::new(social));
        self
    }

    pub fn with_articles(mut self, articles: impl ArticleSource + 'static) -> Self {
        self.articles = Some(Box::new(articles));
        self
    }

    /// Narrow the subreddit search to a topic
    pub fn with_subreddit_topic(mut self, topic: impl Into<String>) -> Self {
        self.subreddit_topic = Some(topic.into());
        self
    }

    /// Delay enforced before each external network step
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    fn model(&self) -> Option<&dyn ChatModel> {
        self.model.as_deref()
    }

    async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    /// Identify the prospect, gather everything and synthesize the report
    pub async fn run(&self, identifier: &str) -> Result<ProfileReport, ProfileError> {
        ::log::info!("Starting profile run for: {}", identifier);
        let prospect = identify(identifier)?;

        let dataset = self.gather(&prospect).await;

        let website = prospect.website();
        if self.model.is_some() {
            self.pause().await;
        }
        ::log::info!("Step: report synthesis");
        let synthesis = synthesize(self.model(), &prospect.company_name, website.as_deref(), &dataset).await;

        ::log::info!("Finished profile run for: {}", identifier);
        Ok(ProfileReport {
            company_name: prospect.company_name,
            domain: prospect.domain,
            dataset,
            synthesis,
        })
    }

    /// Run every gathering step in order
    pub async fn gather(&self, prospect: &Prospect) -> AggregateDataset {
        let company = prospect.company_name.as_str();
        let website = prospect.website();
        let mut dataset = AggregateDataset::default();
        ::log::info!(
            "Gathering data for \"{}\" (domain: {})",
            company,
            prospect.domain.as_deref().unwrap_or("N/A")
        );

        ::log::info!("Step: language model estimates");
        if self.model.is_some() {
            self.pause().await;
        }
        dataset.llm_estimates = estimate_company(self.model(), company, website.as_deref()).await;

        ::log::info!("Step: website crawl");
        dataset.website_content = self.website_step(prospect).await;

        ::log::info!("Step: search");
        match &self.search {
            Some(search) => {
                let adapters = SearchAdapters::new(&**search, &self.search_config);
                self.pause().await;
                dataset.news_snippets = adapters.news(company).await;
                self.pause().await;
                dataset.size_estimate_snippets = adapters.size_estimates(company).await;
                self.pause().await;
                dataset.subreddits = adapters
                    .subreddits(company, self.subreddit_topic.as_deref())
                    .await;
            }
            None => {
                ::log::info!("Search is not configured, skipping news, size and subreddit searches");
                let skipped = DatasetEntry::skipped("Search API not configured");
                dataset.news_snippets = skipped.clone();
                dataset.size_estimate_snippets = skipped.clone();
                dataset.subreddits = skipped;
            }
        }

        ::log::info!("Step: social media links");
        dataset.social_media_links = self.social_step(prospect).await;

        ::log::info!("Step: press-release articles");
        dataset.articles = match &self.articles {
            Some(source) => {
                self.pause().await;
                match source.articles(company, self.model()).await {
                    Ok(articles) => {
                        ::log::info!("Collected {} articles", articles.len());
                        DatasetEntry::Articles(articles)
                    }
                    Err(e) => {
                        ::log::error!("Article search for {} failed: {}", company, e);
                        DatasetEntry::failed("Article search", e)
                    }
                }
            }
            None => DatasetEntry::skipped("Article search not configured"),
        };

        dataset
    }

    async fn website_step(&self, prospect: &Prospect) -> DatasetEntry {
        let Some(domain) = prospect.domain.as_deref() else {
            ::log::info!("No domain for website crawl");
            return DatasetEntry::skipped("Domain unknown or not confirmed");
        };
        let Some(site) = &self.site else {
            ::log::info!("No browser available, skipping website crawl of {}", domain);
            return DatasetEntry::skipped("Browser scraping disabled");
        };

        self.pause().await;
        match site.scrape_site(domain).await {
            Ok(report) => {
                ::log::info!(
                    "Website crawl captured {} subpages ({} chars)",
                    report.subpage_count(),
                    report.text.chars().count()
                );
                DatasetEntry::Text(report.text)
            }
            Err(e) => {
                ::log::error!("Website crawl of {} failed: {}", domain, e);
                DatasetEntry::failed("Website scraping", e)
            }
        }
    }

    async fn social_step(&self, prospect: &Prospect) -> DatasetEntry {
        let Some(domain) = prospect.domain.as_deref() else {
            return DatasetEntry::skipped("No domain provided");
        };
        let Some(social) = &self.social else {
            return DatasetEntry::skipped("Social media link search not configured");
        };

        self.pause().await;
        match social.find_links(domain).await {
            Ok(links) if links.is_empty() => DatasetEntry::Placeholder(links.to_string()),
            Ok(links) => DatasetEntry::Text(links.to_string()),
            Err(e) => {
                ::log::error!("Social media link search for {} failed: {}", domain, e);
                DatasetEntry::failed("Social media links search", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CrawlError, FetchError, LlmError};
    use crate::llm::{ChatMessage, GenerationParams};
    use crate::results::{Article, ArticleSummary, CrawlReport, ScrapedPage};
    use crate::search::{SearchOutcome, SearchQuery, SearchRecord};
    use crate::social::SocialLinks;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct Model {
        log: CallLog,
        fail: bool,
    }

    #[async_trait]
    impl ChatModel for Model {
        fn model(&self) -> &str {
            "double"
        }

        async fn complete(
            &self,
            messages: &[ChatMessage],
            params: GenerationParams,
        ) -> Result<String, LlmError> {
            self.log.lock().unwrap().push(format!("llm:{}", params.max_tokens));
            if self.fail {
                return Err(LlmError::EmptyResponse {
                    finish_reason: "length".to_string(),
                });
            }
            Ok(format!("reply to {} messages", messages.len()))
        }
    }

    struct Site {
        log: CallLog,
        fail: bool,
    }

    #[async_trait]
    impl SiteScraper for Site {
        async fn scrape_site(&self, base_url: &str) -> Result<CrawlReport, CrawlError> {
            self.log.lock().unwrap().push(format!("site:{}", base_url));
            if self.fail {
                return Err(CrawlError::Timeout(base_url.to_string()));
            }
            let page = ScrapedPage::homepage(format!("https://{}/", base_url), "Welcome to Acme");
            Ok(CrawlReport {
                base_url: base_url.to_string(),
                text: page.section(),
                pages: vec![page],
            })
        }
    }

    struct Search {
        log: CallLog,
        fail: bool,
    }

    #[async_trait]
    impl WebSearch for Search {
        async fn search(&self, query: &SearchQuery) -> SearchOutcome {
            self.log.lock().unwrap().push(format!("search:{}", query.count));
            if self.fail {
                return SearchOutcome::Failure {
                    reason: "status 500".to_string(),
                };
            }
            SearchOutcome::Success {
                records: vec![SearchRecord {
                    title: "Acme raises $10 million".to_string(),
                    description: "Acme has 120 employees and a r/acme community of 5k members".to_string(),
                    url: "https://www.reddit.com/r/acme".to_string(),
                    provider: "Reddit".to_string(),
                    date_published: "2024-01-01".to_string(),
                }],
                source: None,
                message: None,
            }
        }
    }

    struct Social {
        log: CallLog,
        fail: bool,
    }

    #[async_trait]
    impl SocialLinkFinder for Social {
        async fn find_links(&self, domain: &str) -> Result<SocialLinks, FetchError> {
            self.log.lock().unwrap().push(format!("social:{}", domain));
            if self.fail {
                return Err(FetchError::Timeout(domain.to_string()));
            }
            Ok(SocialLinks {
                links: vec![("LinkedIn", "https://linkedin.com/company/acme".to_string())],
            })
        }
    }

    struct Articles {
        log: CallLog,
        fail: bool,
    }

    #[async_trait]
    impl ArticleSource for Articles {
        async fn articles(
            &self,
            company: &str,
            _model: Option<&dyn ChatModel>,
        ) -> Result<Vec<Article>, FetchError> {
            self.log.lock().unwrap().push(format!("articles:{}", company));
            if self.fail {
                return Err(FetchError::Status {
                    url: "https://wire.test".to_string(),
                    status: 503,
                });
            }
            Ok(vec![Article {
                title: "Acme expands".to_string(),
                url: "https://wire.test/a/1".to_string(),
                date: "2024-01-01 00:00:00".to_string(),
                source: "Acme".to_string(),
                content: "Acme expands into Europe.".to_string(),
                summary: ArticleSummary::Skipped("no client".to_string()),
            }])
        }
    }

    fn profiler(log: &CallLog, fail: bool) -> Profiler {
        Profiler::new()
            .with_model(Model { log: log.clone(), fail })
            .with_site_scraper(Site { log: log.clone(), fail })
            .with_search(Search { log: log.clone(), fail }, ProfilerConfig::default().search)
            .with_social(Social { log: log.clone(), fail })
            .with_articles(Articles { log: log.clone(), fail })
    }

    #[tokio::test]
    async fn test_every_key_is_populated_when_everything_fails() {
        let log = CallLog::default();
        let report = profiler(&log, true).run("acme.com").await.unwrap();

        for (key, entry) in report.dataset.entries() {
            assert!(entry.is_placeholder(), "{} should be a placeholder", key);
        }
        assert_eq!(
            report.dataset.website_content,
            DatasetEntry::Placeholder("[Website scraping failed: timed out waiting for page body at acme.com]".to_string())
        );
        assert!(matches!(report.synthesis, Synthesis::Failed { .. }));

        let value = serde_json::to_value(&report.dataset).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let log = CallLog::default();
        let report = profiler(&log, false).run("acme.com").await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "llm:300",
                "site:acme.com",
                "search:7",
                "search:5",
                "search:10",
                "social:acme.com",
                "articles:Acme",
                "llm:3800",
            ]
        );
        assert_eq!(report.synthesis.report(), Some("reply to 2 messages"));
        assert!(matches!(&report.dataset.website_content, DatasetEntry::Text(t) if t.contains("Welcome to Acme")));
        assert!(matches!(&report.dataset.articles, DatasetEntry::Articles(a) if a.len() == 1));
        assert!(matches!(&report.dataset.social_media_links, DatasetEntry::Text(t) if t.contains("LinkedIn")));
    }

    #[tokio::test]
    async fn test_missing_collaborators_are_skipped() {
        let report = Profiler::new().run("Acme Widgets").await.unwrap();

        assert_eq!(report.domain.as_deref(), Some("acmewidgets.com"));
        assert_eq!(
            report.dataset.website_content,
            DatasetEntry::Placeholder("[Skipped - Browser scraping disabled]".to_string())
        );
        assert_eq!(
            report.dataset.news_snippets,
            DatasetEntry::Placeholder("[Skipped - Search API not configured]".to_string())
        );
        assert!(report.dataset.entries().iter().all(|(_, e)| e.is_placeholder()));
        assert!(matches!(report.synthesis, Synthesis::Failed { .. }));
    }

    #[tokio::test]
    async fn test_empty_identifier_does_not_start() {
        let log = CallLog::default();
        let result = profiler(&log, false).run("  ").await;
        assert!(matches!(result, Err(ProfileError::EmptyIdentifier)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_from_default_config() {
        let profiler = Profiler::from_config(&ProfilerConfig::default()).unwrap();
        assert!(profiler.model.is_none());
        assert!(profiler.search.is_none());
        assert!(profiler.site.is_some());
        assert!(profiler.social.is_some());
        assert!(profiler.articles.is_some());
        assert_eq!(profiler.request_delay, Duration::from_millis(3000));
    }

    #[test]
    fn test_disabled_crawl_has_no_site_scraper() {
        let mut config = ProfilerConfig::default();
        config.crawl.disabled = true;
        let profiler = Profiler::from_config(&config).unwrap();
        assert!(profiler.site.is_none());
    }
}
