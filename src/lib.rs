//! dota-price-checker - Batch Steam Community Market price checker
//!
//! Takes a list of Dota 2 item names, looks each one up on the market one at a
//! time, and produces a tab-separated report plus an aggregate summary.

pub mod batch;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod market;
pub mod report;
pub mod session;

pub use batch::{BatchOutcome, BatchScraper, PacingPolicy, ScrapeEvent, ScrapeResult, ScrapeSummary};
pub use config::Config;
pub use error::ScrapeError;
pub use market::{ItemRequest, MarketClient, PriceQuote, PriceSource, QuoteStatus};
pub use session::{ScrapeSession, SessionRegistry};
