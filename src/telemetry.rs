//! # Self-Telemetry
//!
//! Both binaries count what they do through the `metrics` facade. Without an
//! installed recorder those calls are no-ops. When a listen address is
//! configured, `TelemetryBuilder` installs a Prometheus recorder and returns a
//! `TelemetryServer` that serves `/metrics` on its own listener, separate from
//! the metric API.

use crate::config::TelemetryConfig;
use crate::task_manager::shutdown_signalled;
use anyhow::{anyhow, Context, Result};
use axum::{routing::get, Router};
use metrics::Unit;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, trace};

/// Registers descriptions for every internal metric with the global recorder.
pub fn describe_metrics() {
    metrics::describe_counter!("metric_updates_total", Unit::Count, "Metric updates accepted by the server, labeled by kind.");
    metrics::describe_counter!("metric_update_rejections_total", Unit::Count, "Metric updates rejected with 400, labeled by reason.");
    metrics::describe_counter!("metric_reads_total", Unit::Count, "Single-metric reads served, labeled by kind.");
    metrics::describe_counter!("agent_polls_total", Unit::Count, "Runtime sampling cycles completed by the agent.");
    metrics::describe_counter!("agent_reports_sent_total", Unit::Count, "Metric values successfully pushed to the server.");
    metrics::describe_counter!("agent_report_failures_total", Unit::Count, "Metric values the agent failed to push.");
}

/// Serves the Prometheus rendering of the internal metrics.
pub struct TelemetryServer {
    listener: TcpListener,
    handle: PrometheusHandle,
    shutdown_rx: watch::Receiver<bool>,
}

impl TelemetryServer {
    pub fn new(
        listener: TcpListener,
        handle: PrometheusHandle,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            listener,
            handle,
            shutdown_rx,
        }
    }

    /// Returns a future that serves `/metrics` until shutdown is signalled.
    pub fn run(self) -> impl Future<Output = ()> {
        let Self {
            listener,
            handle,
            mut shutdown_rx,
        } = self;
        let app = Router::new().route("/metrics", get(move || async move { handle.render() }));

        async move {
            let shutdown = async move {
                shutdown_signalled(&mut shutdown_rx).await;
                trace!("Telemetry server received shutdown signal.");
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("Telemetry server error: {}", e);
            }
            trace!("Telemetry server task finished.");
        }
    }
}

/// Installs the Prometheus recorder and binds the telemetry listener.
pub struct TelemetryBuilder {
    config: TelemetryConfig,
}

impl TelemetryBuilder {
    pub fn new(config: TelemetryConfig) -> Self {
        Self { config }
    }

    /// Returns `None` when telemetry is disabled.
    ///
    /// The global recorder can only be installed once per process.
    pub async fn build(
        self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Option<(TelemetryServer, SocketAddr)>> {
        let Some(listen_address) = self.config.listen_address else {
            return Ok(None);
        };

        let listener = TcpListener::bind(listen_address)
            .await
            .with_context(|| format!("failed to bind telemetry server to {}", listen_address))?;
        let addr = listener.local_addr()?;

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::set_global_recorder(recorder)
            .map_err(|_| anyhow!("a metrics recorder is already installed"))?;
        describe_metrics();

        Ok(Some((TelemetryServer::new(listener, handle, shutdown_rx), addr)))
    }
}
