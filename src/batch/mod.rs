//! Batch orchestration: pacing, counters, progress events, cancellation.

pub mod models;
pub mod pacing;
pub mod runner;

pub use models::{BatchOutcome, RunState, ScrapeEvent, ScrapeResult, ScrapeSummary};
pub use pacing::PacingPolicy;
pub use runner::BatchScraper;
