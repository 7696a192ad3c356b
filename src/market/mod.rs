//! Steam Community Market lookups: name normalization, HTTP client, price parsing.

pub mod client;
pub mod models;
pub mod normalize;
pub mod parser;

pub use client::{MarketClient, PriceSource};
pub use models::{ItemRequest, NormalizedName, PriceOverview, PriceQuote, QuoteStatus};
pub use normalize::normalize;
pub use parser::parse_price;
