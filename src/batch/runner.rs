//! Sequential batch runner.
//!
//! Items are fetched strictly one at a time and in input order; parallel
//! requests trip the market's rate limiting.

use crate::batch::models::{BatchOutcome, RunState, ScrapeEvent, ScrapeResult, ScrapeSummary};
use crate::batch::pacing::PacingPolicy;
use crate::error::ScrapeError;
use crate::market::{normalize, ItemRequest, PriceSource};
use crate::report::ReportSink;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Runs one batch of lookups. Consumed by [`BatchScraper::run`].
pub struct BatchScraper<S> {
    source: S,
    pacing: PacingPolicy,
    events: Option<mpsc::UnboundedSender<ScrapeEvent>>,
    cancel: CancellationToken,
    state: watch::Sender<RunState>,
}

impl<S: PriceSource> BatchScraper<S> {
    /// Creates a runner over a price source.
    pub fn new(source: S, pacing: PacingPolicy) -> Self {
        let (state, _) = watch::channel(RunState::NotStarted);
        Self { source, pacing, events: None, cancel: CancellationToken::new(), state }
    }

    /// Streams progress events to `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<ScrapeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts the run between items.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Watches the run state.
    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Processes `items` in order, streaming rows into `sink`.
    ///
    /// Per-item failures become rows. Only empty input (before anything runs)
    /// and sink failures are returned as errors.
    pub async fn run<R>(self, items: &[ItemRequest], sink: &mut R) -> Result<BatchOutcome, ScrapeError>
    where
        R: ReportSink + ?Sized,
    {
        validate(items)?;

        let total = items.len();
        let started = Instant::now();

        self.state.send_replace(RunState::Running);
        self.emit(ScrapeEvent::Started { total });
        info!("Starting batch of {} items", total);

        let outcome = self.process(items, sink, started).await;

        self.state.send_replace(RunState::Completed);

        let outcome = outcome?;
        info!(
            "Batch finished: {} ok, {} failed, {} of {} processed",
            outcome.summary.success_count,
            outcome.summary.fail_count,
            outcome.summary.total_items,
            total
        );
        self.emit(ScrapeEvent::Completed { summary: outcome.summary.clone() });

        Ok(outcome)
    }

    async fn process<R>(
        &self,
        items: &[ItemRequest],
        sink: &mut R,
        started: Instant,
    ) -> Result<BatchOutcome, ScrapeError>
    where
        R: ReportSink + ?Sized,
    {
        let total = items.len();
        let mut summary = ScrapeSummary::new();
        let mut results: Vec<ScrapeResult> = Vec::with_capacity(total);
        let mut cancelled = false;

        sink.begin().map_err(|source| ScrapeError::Sink { processed: 0, source })?;

        for (i, item) in items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Batch cancelled after {} of {} items", i, total);
                self.emit(ScrapeEvent::Cancelled { processed: i, total });
                cancelled = true;
                break;
            }

            let index = i + 1;
            let normalized_name = normalize(&item.raw_name);
            let quote = self.source.fetch(&normalized_name).await;
            debug!("[{}/{}] {} -> {:?}", index, total, normalized_name, quote.status);

            let result = ScrapeResult { raw_name: item.raw_name.clone(), normalized_name, quote };

            sink.record(&result).map_err(|source| ScrapeError::Sink { processed: i, source })?;
            summary.record(&result.quote);
            self.emit(ScrapeEvent::Item { index, total, result: result.clone() });
            results.push(result);

            self.pause(self.pacing.item_delay()).await;

            if self.pacing.is_checkpoint(index, total) {
                self.emit(ScrapeEvent::Checkpoint { processed: index, total });

                let cooldown = self.pacing.cooldown();
                if !cooldown.is_zero() {
                    self.emit(ScrapeEvent::Cooldown { duration: cooldown });
                    self.pause(cooldown).await;
                }
            }
        }

        summary.finish(started.elapsed());
        sink.finish(&summary)
            .map_err(|source| ScrapeError::Sink { processed: results.len(), source })?;

        Ok(BatchOutcome { results, summary, cancelled })
    }

    /// Sleeps unless cancelled first.
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        debug!("Pausing {}ms", duration.as_millis());
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.cancel.cancelled() => debug!("Pause interrupted by cancellation"),
        }
    }

    fn emit(&self, event: ScrapeEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching progress
            let _ = events.send(event);
        }
    }
}

fn validate(items: &[ItemRequest]) -> Result<(), ScrapeError> {
    if items.is_empty() {
        return Err(ScrapeError::empty_input());
    }

    if let Some(pos) = items.iter().position(|item| item.raw_name.trim().is_empty()) {
        return Err(ScrapeError::Validation(format!("Item {} has an empty name.", pos + 1)));
    }

    Ok(())
}
