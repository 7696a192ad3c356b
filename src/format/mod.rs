//! Output formatting for batch summaries (text, JSON).

use crate::batch::{BatchOutcome, ScrapeResult, ScrapeSummary};
use crate::config::OutputFormat;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Formats batch outcomes for output.
pub struct Formatter {
    format: OutputFormat,
    sample_lines: usize,
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    summary: &'a ScrapeSummary,
    elapsed_secs: u64,
    cancelled: bool,
    report: Option<String>,
    results: &'a [ScrapeResult],
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format, sample_lines: 0 }
    }

    /// Includes up to `lines` per-item lines in text output.
    pub fn with_sample(mut self, lines: usize) -> Self {
        self.sample_lines = lines;
        self
    }

    /// Formats a finished batch.
    pub fn format_outcome(&self, outcome: &BatchOutcome, report: Option<&Path>) -> String {
        match self.format {
            OutputFormat::Json => self.json_outcome(outcome, report),
            OutputFormat::Text => self.text_outcome(outcome, report),
        }
    }

    // JSON formatting

    fn json_outcome(&self, outcome: &BatchOutcome, report: Option<&Path>) -> String {
        let payload = JsonOutcome {
            summary: &outcome.summary,
            elapsed_secs: outcome.summary.elapsed.as_secs(),
            cancelled: outcome.cancelled,
            report: report.map(|p| p.display().to_string()),
            results: &outcome.results,
        };
        serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string())
    }

    // Text formatting

    fn text_outcome(&self, outcome: &BatchOutcome, report: Option<&Path>) -> String {
        let mut lines = Vec::new();

        let sample = sample_lines(&outcome.results, self.sample_lines);
        if !sample.is_empty() {
            lines.extend(sample);
            if outcome.results.len() > self.sample_lines {
                lines.push(format!("... and {} more", outcome.results.len() - self.sample_lines));
            }
            lines.push(String::new());
        }

        if outcome.cancelled {
            lines.push("Scraping cancelled.".to_string());
        } else {
            lines.push("Scraping complete!".to_string());
        }
        lines.push(summary_block(&outcome.summary));

        if let Some(path) = report {
            lines.push(format!("Report: {}", path.display()));
        }

        lines.join("\n")
    }
}

/// Counters as a short human-readable block.
pub fn summary_block(summary: &ScrapeSummary) -> String {
    [
        format!("Total Items: {}", summary.total_items),
        format!("Success: {}", summary.success_count),
        format!("Failed: {}", summary.fail_count),
        format!("Total Value: ₱{}", format_amount(summary.total_value)),
        format!("Duration: {}", format_duration(summary.elapsed)),
    ]
    .join("\n")
}

/// First `cap` results as `name → price` lines.
pub fn sample_lines(results: &[ScrapeResult], cap: usize) -> Vec<String> {
    results
        .iter()
        .take(cap)
        .map(|r| format!("{} → {}", r.raw_name, r.quote.raw_text))
        .collect()
}

/// Two decimals with comma thousands separators: `1234567.5` -> `1,234,567.50`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Whole minutes and seconds: `Xm Ys`.
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}
