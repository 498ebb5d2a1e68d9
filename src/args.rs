use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "prospect-profile")]
#[command(about = "Gathers open-web information about a company and writes a sales profile")]
#[command(version)]
pub struct Args {
    /// Company domain (e.g. acme.com) or company name
    pub identifier: String,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of subpages crawled after the homepage
    #[arg(long)]
    pub max_subpages: Option<usize>,

    /// Cap on the crawled website text, in characters
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Directory the report and dataset are written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the browser crawl of the company website
    #[arg(long)]
    pub no_browser: bool,

    /// Narrow the subreddit search to a topic
    #[arg(long)]
    pub topic: Option<String>,
}
