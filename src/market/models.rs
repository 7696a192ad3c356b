//! Data models for item requests, market responses, and price quotes.

use crate::market::parser::parse_price;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Report text for a quote the market answered but has no listing for.
pub const NO_LISTING_TEXT: &str = "No price listed";

/// Report text for a quote that exhausted its retries.
pub const FETCH_ERROR_TEXT: &str = "Error fetching price";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    /// Item name exactly as the user typed it (trimmed)
    pub raw_name: String,
}

impl ItemRequest {
    /// Creates a new item request.
    pub fn new(raw_name: impl Into<String>) -> Self {
        Self { raw_name: raw_name.into() }
    }
}

/// Item name in the canonical form the market matches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for NormalizedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of the market's `priceoverview` endpoint.
///
/// Every field is optional on the wire; `success` defaults to false so a body
/// without it is treated as a failed lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceOverview {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub lowest_price: Option<String>,
    #[serde(default)]
    pub median_price: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
}

impl PriceOverview {
    /// Lowest listing if present, else the median sale price.
    pub fn best_price(&self) -> Option<&str> {
        self.lowest_price
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.median_price.as_deref().filter(|p| !p.is_empty()))
    }
}

/// Outcome of a single price lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// The market returned a price
    Success,
    /// The market answered but has no listing or sale history
    NoListing,
    /// Every attempt failed (network, status, or malformed body)
    FetchError,
}

impl QuoteStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, QuoteStatus::Success)
    }
}

/// Price lookup result for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price text as shown in the report
    pub raw_text: String,
    /// Parsed value; 0.0 for anything that is not a parseable price
    pub numeric_value: f64,
    pub status: QuoteStatus,
}

impl PriceQuote {
    /// A quote with a price string from the market.
    pub fn success(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let numeric_value = parse_price(&raw_text);
        Self { raw_text, numeric_value, status: QuoteStatus::Success }
    }

    pub fn no_listing() -> Self {
        Self {
            raw_text: NO_LISTING_TEXT.to_string(),
            numeric_value: 0.0,
            status: QuoteStatus::NoListing,
        }
    }

    pub fn fetch_error() -> Self {
        Self {
            raw_text: FETCH_ERROR_TEXT.to_string(),
            numeric_value: 0.0,
            status: QuoteStatus::FetchError,
        }
    }

    /// Rebuilds a quote from the price column of a saved report.
    pub fn from_report_text(raw_text: &str) -> Self {
        match raw_text.trim() {
            NO_LISTING_TEXT => Self::no_listing(),
            FETCH_ERROR_TEXT => Self::fetch_error(),
            other => Self::success(other),
        }
    }

    /// Amount this quote adds to the batch total.
    pub fn contribution(&self) -> f64 {
        if self.status.is_success() {
            self.numeric_value
        } else {
            0.0
        }
    }
}
