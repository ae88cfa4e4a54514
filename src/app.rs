//! Process wiring for the two binaries, decoupled from their entry points.

use crate::{
    agent::{Agent, Reporter, SystemSampler},
    config::{AgentConfig, ServerConfig, TelemetryConfig},
    server::{HttpServer, SharedRepository},
    storage::MemStorage,
    task_manager::TaskManager,
    telemetry::TelemetryBuilder,
};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

async fn start_telemetry(
    config: &TelemetryConfig,
    task_manager: &mut TaskManager,
) -> Result<Option<SocketAddr>> {
    match TelemetryBuilder::new(config.clone())
        .build(task_manager.subscribe())
        .await?
    {
        Some((server, addr)) => {
            info!("Telemetry endpoint listening on http://{}/metrics", addr);
            task_manager.spawn("TelemetryServer", server.run());
            Ok(Some(addr))
        }
        None => Ok(None),
    }
}

/// A running metrics server.
pub struct ServerApp {
    task_manager: TaskManager,
    address: SocketAddr,
    repository: SharedRepository,
    telemetry_addr: Option<SocketAddr>,
}

impl ServerApp {
    /// Starts a server backed by fresh in-memory storage.
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        Self::start_with_repository(config, Arc::new(MemStorage::new())).await
    }

    /// Starts a server backed by the given repository.
    pub async fn start_with_repository(
        config: &ServerConfig,
        repository: SharedRepository,
    ) -> Result<Self> {
        let mut task_manager = TaskManager::new();
        let telemetry_addr = start_telemetry(&config.telemetry, &mut task_manager).await?;

        let server = HttpServer::bind(
            &config.address,
            repository.clone(),
            task_manager.subscribe(),
        )
        .await
        .with_context(|| format!("failed to bind HTTP server to {}", config.address))?;
        let address = server.local_addr()?;
        task_manager.spawn("HttpServer", server.run());
        info!("Server is listening on http://{}", address);

        Ok(Self {
            task_manager,
            address,
            repository,
            telemetry_addr,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn repository(&self) -> &SharedRepository {
        &self.repository
    }

    pub fn telemetry_addr(&self) -> Option<SocketAddr> {
        self.telemetry_addr
    }

    /// Stops accepting requests and waits for in-flight ones to finish.
    pub async fn shutdown(self) {
        self.task_manager.shutdown().await;
    }
}

/// A running collection agent.
pub struct AgentApp {
    task_manager: TaskManager,
    telemetry_addr: Option<SocketAddr>,
}

impl AgentApp {
    pub async fn start(config: &AgentConfig) -> Result<Self> {
        if config.poll_slower_than_report() {
            warn!(
                "Poll interval ({}s) is longer than report interval ({}s); some reports will resend unchanged values",
                config.poll_interval_seconds, config.report_interval_seconds
            );
        }

        let mut task_manager = TaskManager::new();
        let telemetry_addr = start_telemetry(&config.telemetry, &mut task_manager).await?;

        let reporter = Reporter::new(
            &config.address,
            Duration::from_millis(config.request_timeout_ms),
        )
        .context("failed to build HTTP client")?;
        info!("Sending metrics to {}", reporter.base_url());

        let agent = Agent::new(
            SystemSampler::new(),
            reporter,
            Duration::from_secs(config.poll_interval_seconds),
            Duration::from_secs(config.report_interval_seconds),
        );
        let shutdown_rx = task_manager.subscribe();
        task_manager.spawn("Agent", agent.run(shutdown_rx));

        Ok(Self {
            task_manager,
            telemetry_addr,
        })
    }

    pub fn telemetry_addr(&self) -> Option<SocketAddr> {
        self.telemetry_addr
    }

    pub async fn shutdown(self) {
        self.task_manager.shutdown().await;
    }
}
