//! Batch results, aggregate counters, and progress events.

use crate::market::models::{NormalizedName, PriceQuote};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One report row: what the user typed, what we looked up, what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub raw_name: String,
    pub normalized_name: NormalizedName,
    pub quote: PriceQuote,
}

/// Aggregate counters for a batch.
///
/// `success_count + fail_count == total_items` holds after every call to
/// [`ScrapeSummary::record`], and `total_value` only sums successful quotes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeSummary {
    pub total_items: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub total_value: f64,
    pub elapsed: Duration,
}

impl ScrapeSummary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one quote.
    pub fn record(&mut self, quote: &PriceQuote) {
        self.total_items += 1;
        if quote.status.is_success() {
            self.success_count += 1;
            self.total_value += quote.contribution();
        } else {
            self.fail_count += 1;
        }
    }

    /// Stamps the wall-clock duration of the run.
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Rebuilds counters from a list of results (elapsed stays zero).
    pub fn from_results(results: &[ScrapeResult]) -> Self {
        let mut summary = Self::new();
        for result in results {
            summary.record(&result.quote);
        }
        summary
    }
}

/// Lifecycle of a single batch. There is no failed state: per-item errors are rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
}

/// Progress notifications for whoever is driving the batch.
#[derive(Debug, Clone)]
pub enum ScrapeEvent {
    /// Input validated, first fetch about to start
    Started { total: usize },
    /// One item finished (1-based index)
    Item { index: usize, total: usize, result: ScrapeResult },
    /// Periodic "N/M processed" marker
    Checkpoint { processed: usize, total: usize },
    /// Rate-limit pause about to start
    Cooldown { duration: Duration },
    /// Abort requested; remaining items are skipped
    Cancelled { processed: usize, total: usize },
    /// Final counters
    Completed { summary: ScrapeSummary },
}

/// Everything a finished batch produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Rows in input order
    pub results: Vec<ScrapeResult>,
    pub summary: ScrapeSummary,
    /// True if the run stopped early on request
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::normalize;

    fn make_result(name: &str, quote: PriceQuote) -> ScrapeResult {
        ScrapeResult {
            raw_name: name.to_string(),
            normalized_name: normalize(name),
            quote,
        }
    }

    #[test]
    fn test_summary_record() {
        let mut summary = ScrapeSummary::new();
        summary.record(&PriceQuote::success("₱10.00"));
        summary.record(&PriceQuote::no_listing());
        summary.record(&PriceQuote::fetch_error());
        summary.record(&PriceQuote::success("₱1,000.25"));

        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.fail_count, 2);
        assert_eq!(summary.total_value, 1010.25);
        assert_eq!(summary.success_count + summary.fail_count, summary.total_items);
    }

    #[test]
    fn test_summary_zero_price_success() {
        // A free item still counts as a success
        let mut summary = ScrapeSummary::new();
        summary.record(&PriceQuote::success("₱0.00"));
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.fail_count, 0);
        assert_eq!(summary.total_value, 0.0);
    }

    #[test]
    fn test_summary_from_results() {
        let results = vec![
            make_result("Widget A", PriceQuote::success("₱10.00")),
            make_result("Widget B", PriceQuote::no_listing()),
        ];

        let summary = ScrapeSummary::from_results(&results);
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.fail_count, 1);
        assert_eq!(summary.total_value, 10.0);
        assert_eq!(summary.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_summary_finish() {
        let mut summary = ScrapeSummary::new();
        summary.finish(Duration::from_secs(125));
        assert_eq!(summary.elapsed.as_secs(), 125);
    }

    #[test]
    fn test_run_state_serde() {
        assert_eq!(serde_json::to_string(&RunState::NotStarted).unwrap(), "\"not_started\"");
    }
}
