//! Batch-level errors surfaced to the caller.
//!
//! Per-item failures never show up here: they are recorded as
//! [`QuoteStatus::FetchError`](crate::market::QuoteStatus) rows and the batch keeps going.

use thiserror::Error;

/// Errors that abort a batch or reject it before it starts.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Input rejected before any network activity.
    #[error("{0}")]
    Validation(String),

    /// A run is already in flight for this session.
    #[error("A scrape is already running for session '{0}'. Wait for it to finish.")]
    SessionBusy(String),

    /// The report sink failed; `processed` rows were already written.
    #[error("Failed to write report after {processed} item(s): {source}")]
    Sink {
        processed: usize,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be read back.
    #[error("Malformed report at line {line}: {message}")]
    Report { line: usize, message: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to build market client: {0}")]
    Client(String),
}

impl ScrapeError {
    /// Shorthand for the empty-input rejection shown to the user.
    pub fn empty_input() -> Self {
        ScrapeError::Validation("Please send valid item names (one per line).".to_string())
    }

    /// True for errors the user caused by sending bad input.
    pub fn is_validation(&self) -> bool {
        matches!(self, ScrapeError::Validation(_))
    }
}
