//! Metrics agent entry point.

use anyhow::{Context, Result};
use clap::Parser;
use pcmetrics::{
    app::AgentApp,
    cli::AgentCli,
    config::{AgentConfig, EnvOverrides},
    logging,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = AgentCli::parse();
    let env = EnvOverrides::agent();

    let config = AgentConfig::load(&cli, &env).context("failed to load configuration")?;
    logging::init(&config.log_level, config.log_file.as_deref())?;

    for message in env.rejected() {
        warn!("{}", message);
    }

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Server Address: {}", config.address);
    info!("Poll Interval: {}s", config.poll_interval_seconds);
    info!("Report Interval: {}s", config.report_interval_seconds);
    info!("Request Timeout: {}ms", config.request_timeout_ms);
    match config.telemetry.listen_address {
        Some(addr) => info!("Telemetry: {}", addr),
        None => info!("Telemetry: Disabled"),
    }
    info!("-------------------------------------------------------");

    let app = AgentApp::start(&config).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");
    app.shutdown().await;

    info!("Exiting.");
    Ok(())
}
