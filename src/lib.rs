// Re-export modules
pub mod articles;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod http;
pub mod llm;
pub mod orchestrator;
pub mod parsers;
pub mod results;
pub mod scoring;
pub mod search;
pub mod social;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::ProfilerConfig;
pub use error::ProfileError;
pub use llm::prompts::Synthesis;
pub use orchestrator::{ProfileReport, Profiler};
pub use results::{AggregateDataset, DatasetEntry};
pub use utils::{Prospect, identify};
