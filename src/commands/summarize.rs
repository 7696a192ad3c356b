//! Summarize command: recounts a saved report.

use crate::batch::{BatchOutcome, ScrapeSummary};
use crate::config::OutputFormat;
use crate::format::Formatter;
use crate::report::read_report;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Rebuilds the summary of an earlier run from its report file.
pub struct SummarizeCommand {
    format: OutputFormat,
    sample_lines: usize,
}

impl SummarizeCommand {
    /// Creates a new summarize command.
    pub fn new(format: OutputFormat, sample_lines: usize) -> Self {
        Self { format, sample_lines }
    }

    /// Reads the report at `path` and returns formatted output.
    pub fn execute(&self, path: &Path) -> Result<String> {
        let results = read_report(path)
            .with_context(|| format!("Failed to read report: {}", path.display()))?;

        info!("Loaded {} rows from {}", results.len(), path.display());

        // Reports carry no timing, so elapsed stays zero
        let summary = ScrapeSummary::from_results(&results);
        let outcome = BatchOutcome { results, summary, cancelled: false };

        let formatter = Formatter::new(self.format).with_sample(self.sample_lines);
        Ok(formatter.format_outcome(&outcome, Some(path)))
    }
}
