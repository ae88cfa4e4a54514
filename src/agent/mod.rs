//! # Collection Agent
//!
//! The agent samples runtime statistics on a poll interval and pushes the
//! whole snapshot to the server on a (usually longer) report interval.
//!
//! Both actions share one task. Reports are awaited inline, so a slow server
//! delays the next tick instead of overlapping report windows; ticks missed
//! that way are skipped rather than replayed.

pub mod reporter;
pub mod sampler;
pub mod snapshot;

use crate::task_manager::shutdown_signalled;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub use reporter::{ReportError, ReportSummary, Reporter};
pub use sampler::{RuntimeSampler, SystemSampler};
pub use snapshot::MetricsSnapshot;

/// Owns the snapshot, the sampler feeding it and the reporter draining it.
pub struct Agent<S: RuntimeSampler> {
    sampler: S,
    snapshot: MetricsSnapshot,
    reporter: Reporter,
    poll_interval: Duration,
    report_interval: Duration,
}

impl<S: RuntimeSampler> Agent<S> {
    /// Both intervals must be non-zero.
    pub fn new(
        sampler: S,
        reporter: Reporter,
        poll_interval: Duration,
        report_interval: Duration,
    ) -> Self {
        Self {
            sampler,
            snapshot: MetricsSnapshot::new(),
            reporter,
            poll_interval,
            report_interval,
        }
    }

    pub fn snapshot(&self) -> &MetricsSnapshot {
        &self.snapshot
    }

    /// Runs one poll cycle.
    pub fn poll(&mut self) {
        self.snapshot.poll(&mut self.sampler);
        metrics::counter!("agent_polls_total").increment(1);
        debug!(metrics = self.snapshot.len(), "Polled runtime metrics");
    }

    /// Sends the current snapshot to the server.
    pub async fn report(&self) -> ReportSummary {
        let summary = self.reporter.report(&self.snapshot).await;
        info!(
            sent = summary.sent,
            failed = summary.failed,
            "Reported metrics to {}",
            self.reporter.base_url()
        );
        summary
    }

    /// Polls and reports until `shutdown_rx` flips to `true`.
    ///
    /// The first poll happens immediately; the first report one report
    /// interval later.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut poll_ticker = time::interval(self.poll_interval);
        poll_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut report_ticker = time::interval_at(
            Instant::now() + self.report_interval,
            self.report_interval,
        );
        report_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Agent started: poll every {:?}, report every {:?} to {}",
            self.poll_interval,
            self.report_interval,
            self.reporter.base_url()
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_signalled(&mut shutdown_rx) => {
                    info!("Agent received shutdown signal.");
                    break;
                }
                _ = poll_ticker.tick() => {
                    self.poll();
                }
                _ = report_ticker.tick() => {
                    self.report().await;
                }
            }
        }
        info!("Agent finished.");
    }
}
