//! Pushes a snapshot to the server, one POST per metric.

use super::snapshot::MetricsSnapshot;
use crate::core::{format_counter, format_gauge, MetricKind};
use reqwest::{header::CONTENT_TYPE, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("request for {kind} {name} failed: {source}")]
    Transport {
        kind: MetricKind,
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status} for {kind} {name}")]
    Status {
        kind: MetricKind,
        name: String,
        status: StatusCode,
    },
}

/// Outcome of one report cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Sends metric values to the server's update endpoint.
#[derive(Debug, Clone)]
pub struct Reporter {
    client: reqwest::Client,
    base_url: String,
}

impl Reporter {
    /// Creates a reporter targeting `server_url`.
    ///
    /// A bare `host:port` gets an `http://` scheme.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: normalize_server_url(server_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts a single value to `<server>/update/<kind>/<name>/<value>`.
    pub async fn send_metric(
        &self,
        kind: MetricKind,
        name: &str,
        value: &str,
    ) -> Result<(), ReportError> {
        let url = format!("{}/update/{}/{}/{}", self.base_url, kind, name, value);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "text/plain")
            .send()
            .await
            .map_err(|source| ReportError::Transport {
                kind,
                name: name.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ReportError::Status {
                kind,
                name: name.to_string(),
                status,
            });
        }
        debug!(%url, "Metric sent");
        Ok(())
    }

    /// Sends every gauge and counter in `snapshot`.
    ///
    /// Failures are logged and skipped; the next report re-sends all current
    /// values anyway.
    #[instrument(skip_all, fields(server = %self.base_url, metrics = snapshot.len()))]
    pub async fn report(&self, snapshot: &MetricsSnapshot) -> ReportSummary {
        let gauges = snapshot
            .gauges()
            .iter()
            .map(|(name, value)| (MetricKind::Gauge, name, format_gauge(*value)));
        let counters = snapshot
            .counters()
            .iter()
            .map(|(name, value)| (MetricKind::Counter, name, format_counter(*value)));

        let mut summary = ReportSummary::default();
        for (kind, name, value) in gauges.chain(counters) {
            match self.send_metric(kind, name, &value).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    warn!("{}", e);
                    summary.failed += 1;
                }
            }
        }

        metrics::counter!("agent_reports_sent_total").increment(summary.sent as u64);
        metrics::counter!("agent_report_failures_total").increment(summary.failed as u64);
        summary
    }
}

/// Trims trailing slashes and adds `http://` when no scheme is given.
pub fn normalize_server_url(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
