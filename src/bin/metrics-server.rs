//! Metrics server entry point.

use anyhow::{Context, Result};
use clap::Parser;
use pcmetrics::{
    app::ServerApp,
    cli::ServerCli,
    config::{EnvOverrides, ServerConfig},
    logging,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ServerCli::parse();
    let env = EnvOverrides::server();

    let config = ServerConfig::load(&cli, &env).context("failed to load configuration")?;
    logging::init(&config.log_level, config.log_file.as_deref())?;

    for message in env.rejected() {
        warn!("{}", message);
    }

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    match &config.log_file {
        Some(path) => info!("Log File: {}", path.display()),
        None => info!("Log File: stderr"),
    }
    info!("Address: {}", config.address);
    match config.telemetry.listen_address {
        Some(addr) => info!("Telemetry: {}", addr),
        None => info!("Telemetry: Disabled"),
    }
    info!("-------------------------------------------------------");

    let app = ServerApp::start(&config).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");
    app.shutdown().await;

    info!("Exiting.");
    Ok(())
}
