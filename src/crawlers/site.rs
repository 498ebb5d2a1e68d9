//! Priority-ranked crawl of a single site.
//!
//! The homepage is always captured first. Its links are filtered to the same
//! site, scored against the keyword taxonomy and visited best-first until the
//! subpage count or the character budget runs out.

use crate::config::CrawlConfig;
use crate::crawlers::crawler::PageSource;
use crate::error::CrawlError;
use crate::filter::{NormalizedUrl, UrlFilter};
use crate::parsers::text::truncate_chars;
use crate::parsers::{ContentScope, Parser};
use crate::results::{CrawlReport, ScrapedPage};
use crate::scoring::{KeywordTaxonomy, LinkCandidate, RankedLink, RelevanceScorer};
use std::collections::HashSet;
use url::Url;

/// Caps enforced while traversing a site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    pub max_subpages: usize,
    pub max_total_chars: usize,
}

impl From<&CrawlConfig> for CrawlBudget {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            max_subpages: config.max_subpages,
            max_total_chars: config.max_total_chars,
        }
    }
}

/// Where a crawl currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Init,
    HomepageFetched,
    LinksDiscovered,
    SubpageLoop,
    Done,
    Failed,
}

/// Crawls one site with a fixed budget and scorer
#[derive(Debug, Clone)]
pub struct SiteCrawler {
    scorer: RelevanceScorer,
    budget: CrawlBudget,
    exclude_patterns: Vec<String>,
}

impl SiteCrawler {
    pub fn new(scorer: RelevanceScorer, budget: CrawlBudget) -> Self {
        Self {
            scorer,
            budget,
            exclude_patterns: Vec::new(),
        }
    }

    /// Crawler with the default taxonomy and the budget, policy and patterns of `config`
    pub fn from_config(config: &CrawlConfig) -> Self {
        let scorer = RelevanceScorer::new(&KeywordTaxonomy::default(), config.scoring_policy);
        Self::new(scorer, CrawlBudget::from(config))
            .with_exclude_patterns(config.exclude_patterns.clone())
    }

    /// Additional regex patterns of URLs never to visit
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Run the crawl against `source`.
    ///
    /// Only a homepage failure is returned as an error; failing subpages are
    /// logged and skipped.
    pub async fn crawl<S>(&self, source: &mut S, base_url: &Url) -> Result<CrawlReport, CrawlError>
    where
        S: PageSource + ?Sized,
    {
        let mut state = CrawlState::Init;
        ::log::info!(
            "Scraping website: {} with priority, up to {} subpages",
            base_url,
            self.budget.max_subpages
        );

        let filter = UrlFilter::for_site(base_url, &self.exclude_patterns)
            .map_err(|e| CrawlError::InvalidBaseUrl(format!("{} ({})", base_url, e)))?;

        // Homepage
        let homepage_source = match source.fetch(base_url).await {
            Ok(html) => html,
            Err(e) => {
                transition(&mut state, CrawlState::Failed, base_url);
                ::log::error!("Homepage {} could not be scraped: {}", base_url, e);
                return Err(e);
            }
        };
        let homepage = Parser::parse(&homepage_source, ContentScope::WholePage);
        transition(&mut state, CrawlState::HomepageFetched, base_url);

        let mut pages = vec![ScrapedPage::homepage(base_url.as_str(), homepage.content)];
        let mut combined = pages[0].section();
        let mut combined_chars = combined.chars().count();

        let mut visited: HashSet<NormalizedUrl> = HashSet::new();
        if let Some(key) = NormalizedUrl::from_url(base_url) {
            visited.insert(key);
        }

        // Link discovery
        ::log::info!("Found {} links on homepage", homepage.links.len());
        let candidates: Vec<LinkCandidate> = homepage
            .links
            .iter()
            .filter_map(|anchor| LinkCandidate::from_anchor(anchor, base_url))
            .filter(|candidate| {
                let keep = filter.should_crawl(&candidate.url);
                if !keep {
                    ::log::trace!("URL filter rejected: {}", candidate.url);
                }
                keep
            })
            .collect();
        let ranked = self.scorer.rank(&candidates);
        transition(&mut state, CrawlState::LinksDiscovered, base_url);
        log_ranking(&ranked);

        // Subpages
        transition(&mut state, CrawlState::SubpageLoop, base_url);
        let mut subpages = 0;
        for link in ranked {
            if subpages >= self.budget.max_subpages {
                ::log::info!(
                    "Reached max subpage limit ({}), stopping",
                    self.budget.max_subpages
                );
                break;
            }
            if visited.contains(&link.normalized_url) {
                ::log::debug!("Skipping already scraped URL: {}", link.normalized_url);
                continue;
            }
            if combined_chars >= self.budget.max_total_chars {
                ::log::info!("Reached text limit for website content, stopping");
                break;
            }

            ::log::info!(
                "Scraping P{} subpage ({}/{}): {}",
                link.score.rank,
                subpages + 1,
                self.budget.max_subpages,
                link.url
            );
            let html = match source.fetch(&link.url).await {
                Ok(html) => html,
                Err(e) => {
                    ::log::warn!("Skipping subpage {}: {}", link.url, e);
                    continue;
                }
            };

            let parsed = Parser::parse(&html, ContentScope::MainContent);
            let page = ScrapedPage::subpage(link.url.as_str(), link.score.rank, parsed.content);
            let section = page.section();
            combined_chars += section.chars().count();
            combined.push_str(&section);
            visited.insert(link.normalized_url);
            pages.push(page);
            subpages += 1;
        }

        transition(&mut state, CrawlState::Done, base_url);
        ::log::info!(
            "Finished scraping. Scraped homepage and {} subpages from {}",
            subpages,
            base_url
        );

        Ok(CrawlReport {
            base_url: base_url.to_string(),
            pages,
            text: truncate_chars(&combined, self.budget.max_total_chars).to_string(),
        })
    }
}

fn transition(state: &mut CrawlState, next: CrawlState, base_url: &Url) {
    ::log::debug!("Crawl of {}: {:?} -> {:?}", base_url, state, next);
    *state = next;
}

fn log_ranking(ranked: &[RankedLink]) {
    if ranked.is_empty() {
        ::log::info!("No potentially relevant subpage URLs identified based on keywords");
        return;
    }
    ::log::info!("Identified {} potentially relevant subpage URLs", ranked.len());
    let top: Vec<&str> = ranked.iter().take(5).map(|l| l.normalized_url.as_str()).collect();
    ::log::info!("Top prioritized URLs: {:?}", top);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Pages served from memory; a missing entry behaves like a body timeout
    struct MemorySource {
        pages: HashMap<String, String>,
        fetched: Vec<String>,
    }

    impl MemorySource {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                fetched: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl PageSource for MemorySource {
        async fn fetch(&mut self, url: &Url) -> Result<String, CrawlError> {
            self.fetched.push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| CrawlError::Timeout(url.to_string()))
        }
    }

    fn crawler(max_subpages: usize, max_total_chars: usize) -> SiteCrawler {
        SiteCrawler::new(
            RelevanceScorer::default(),
            CrawlBudget {
                max_subpages,
                max_total_chars,
            },
        )
    }

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    const HOMEPAGE: &str = r#"<html><body>
        <h1>Example Inc</h1>
        <a href="/random-page">Random</a>
        <a href="/products">Our products</a>
        <a href="/about">About</a>
    </body></html>"#;

    #[tokio::test]
    async fn test_budget_limits_subpages_in_priority_order() {
        let mut source = MemorySource::new(&[
            ("https://example.com/", HOMEPAGE),
            ("https://example.com/about", "<body><main>About text</main></body>"),
            ("https://example.com/products", "<body><main>Products text</main></body>"),
            ("https://example.com/random-page", "<body>Random text</body>"),
        ]);

        let report = crawler(2, 25_000).crawl(&mut source, &base()).await.unwrap();

        assert_eq!(
            source.fetched,
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/products",
            ]
        );
        assert_eq!(report.subpage_count(), 2);
        assert_eq!(report.pages[0].priority, None);
        assert_eq!(report.pages[1].priority, Some(0));
        assert!(report.pages[2].priority.unwrap() > 0);
        assert!(report.text.starts_with("--- Homepage: https://example.com/ ---\nExample Inc"));
        assert!(report.text.contains("--- Subpage (P0): https://example.com/about ---\nAbout text"));
        assert!(report.text.contains("Products text"));
        assert!(!report.text.contains("Random text"));
    }

    #[tokio::test]
    async fn test_subpage_count_is_exact_when_more_links_are_relevant() {
        let homepage = r#"<body>
            <a href="/careers">Careers</a><a href="/team">Team</a>
            <a href="/contact">Contact</a><a href="/about">About</a>
        </body>"#;
        let mut source = MemorySource::new(&[
            ("https://example.com/", homepage),
            ("https://example.com/about", "<body>a</body>"),
            ("https://example.com/team", "<body>t</body>"),
            ("https://example.com/contact", "<body>c</body>"),
            ("https://example.com/careers", "<body>j</body>"),
        ]);

        let report = crawler(3, 25_000).crawl(&mut source, &base()).await.unwrap();
        let urls: Vec<&str> = report.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/team",
                "https://example.com/contact",
            ]
        );
    }

    #[tokio::test]
    async fn test_homepage_failure_is_fatal() {
        let mut source = MemorySource::new(&[]);
        let err = crawler(5, 25_000).crawl(&mut source, &base()).await.unwrap_err();
        assert!(matches!(err, CrawlError::Timeout(_)));
        assert_eq!(source.fetched.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_subpage_is_skipped() {
        let mut source = MemorySource::new(&[
            ("https://example.com/", HOMEPAGE),
            ("https://example.com/products", "<body>Products text</body>"),
        ]);

        let report = crawler(2, 25_000).crawl(&mut source, &base()).await.unwrap();
        assert_eq!(source.fetched.len(), 3);
        assert_eq!(report.subpage_count(), 1);
        assert_eq!(report.pages[1].url, "https://example.com/products");
    }

    #[tokio::test]
    async fn test_foreign_hosts_and_documents_are_never_visited() {
        let homepage = r#"<body>
            <a href="https://other.com/about">About them</a>
            <a href="/about/brochure.pdf">About PDF</a>
            <a href="https://www.example.com/about#top">About</a>
            <a href="/">Home about</a>
        </body>"#;
        let mut source = MemorySource::new(&[
            ("https://example.com/", homepage),
            ("https://www.example.com/about", "<body>About text</body>"),
        ]);

        let report = crawler(5, 25_000).crawl(&mut source, &base()).await.unwrap();
        assert_eq!(
            source.fetched,
            vec!["https://example.com/", "https://www.example.com/about"]
        );
        assert_eq!(report.subpage_count(), 1);
    }

    #[tokio::test]
    async fn test_text_never_exceeds_budget() {
        let long_page = format!("<body>{}</body>", "word ".repeat(200));
        let mut source = MemorySource::new(&[
            ("https://example.com/", HOMEPAGE),
            ("https://example.com/about", long_page.as_str()),
            ("https://example.com/products", long_page.as_str()),
        ]);

        let report = crawler(5, 300).crawl(&mut source, &base()).await.unwrap();
        assert!(report.text.chars().count() <= 300);
        // the budget was exhausted by the first subpage
        assert_eq!(report.subpage_count(), 1);
    }

    #[tokio::test]
    async fn test_page_without_relevant_links() {
        let mut source = MemorySource::new(&[(
            "https://example.com/",
            "<body><p>Nothing here</p><a href=\"/random-page\">x</a></body>",
        )]);
        let report = crawler(5, 25_000).crawl(&mut source, &base()).await.unwrap();
        assert_eq!(report.pages.len(), 1);
        assert_eq!(
            report.text,
            "--- Homepage: https://example.com/ ---\nNothing here\nx\n\n"
        );
    }
}
