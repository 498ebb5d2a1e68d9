pub mod crawler;
pub mod site;
pub mod web;

pub use crawler::{PageSource, SiteScraper};
pub use site::{CrawlBudget, CrawlState, SiteCrawler};
pub use web::{BrowserSession, WebDriverScraper};
