//! Scrape command: runs one batch for a session and renders its progress.

use crate::batch::{BatchOutcome, BatchScraper, ScrapeEvent};
use crate::config::Config;
use crate::format::{format_duration, Formatter};
use crate::market::{MarketClient, PriceSource};
use crate::report::{ReportSink, TsvReport};
use crate::session::{ScrapeSession, SessionRegistry};
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Executes a batch scrape.
pub struct ScrapeCommand {
    config: Config,
    registry: SessionRegistry,
}

impl ScrapeCommand {
    /// Creates a new scrape command.
    pub fn new(config: Config, registry: SessionRegistry) -> Self {
        Self { config, registry }
    }

    /// Scrapes the session's items against the live market.
    ///
    /// The session is claimed before the report file exists, so a rejected
    /// run never touches the output directory.
    pub async fn execute(&self, session: ScrapeSession, cancel: CancellationToken) -> Result<String> {
        let _guard = self.registry.begin(session.id())?;

        let client = MarketClient::new(&self.config).context("Failed to create HTTP client")?;
        let (report, path) = TsvReport::create(&self.config.output_dir).with_context(|| {
            format!("Failed to create report in {}", self.config.output_dir.display())
        })?;
        info!("Writing report to {}", path.display());

        let outcome = self.run_batch(client, session, report, cancel).await?;

        let formatter = Formatter::new(self.config.format).with_sample(self.config.sample_lines);
        Ok(formatter.format_outcome(&outcome, Some(&path)))
    }

    /// Runs the batch on a spawned task with a provided source and sink (for testing).
    pub async fn execute_with_source<S, R>(
        &self,
        source: S,
        session: ScrapeSession,
        sink: R,
        cancel: CancellationToken,
    ) -> Result<BatchOutcome>
    where
        S: PriceSource + 'static,
        R: ReportSink + 'static,
    {
        let _guard = self.registry.begin(session.id())?;
        self.run_batch(source, session, sink, cancel).await
    }

    /// Runs one batch; the caller holds the session guard.
    async fn run_batch<S, R>(
        &self,
        source: S,
        session: ScrapeSession,
        mut sink: R,
        cancel: CancellationToken,
    ) -> Result<BatchOutcome>
    where
        S: PriceSource + 'static,
        R: ReportSink + 'static,
    {
        info!("Scraping {} items for session '{}'", session.len(), session.id());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let scraper = BatchScraper::new(source, self.config.pacing())
            .with_events(tx)
            .with_cancel(cancel);

        let task = tokio::spawn(async move { scraper.run(session.items(), &mut sink).await });

        while let Some(event) = rx.recv().await {
            if let Some(line) = progress_line(&event) {
                eprintln!("{}", line);
            }
        }

        let outcome = task.await.context("Scrape task panicked")??;
        Ok(outcome)
    }
}

/// Progress line for the user, if the event warrants one.
pub fn progress_line(event: &ScrapeEvent) -> Option<String> {
    match event {
        ScrapeEvent::Started { total } => Some(format!("Starting scrape for {} items...", total)),
        ScrapeEvent::Checkpoint { processed, total } => {
            Some(format!("Progress: {}/{} items scraped...", processed, total))
        }
        ScrapeEvent::Cooldown { duration } => Some(format!(
            "Cooling down for {} to avoid Steam rate limits...",
            format_duration(*duration)
        )),
        ScrapeEvent::Cancelled { processed, total } => {
            Some(format!("Cancelled after {}/{} items.", processed, total))
        }
        ScrapeEvent::Item { .. } | ScrapeEvent::Completed { .. } => None,
    }
}
