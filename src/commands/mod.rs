//! CLI command implementations.

pub mod scrape;
pub mod summarize;

pub use scrape::ScrapeCommand;
pub use summarize::SummarizeCommand;
