#![allow(dead_code)]
//! Shared fixtures for the integration tests.

use pcmetrics::app::ServerApp;
use pcmetrics::config::ServerConfig;
use pcmetrics::server::SharedRepository;

pub fn local_config() -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1:0".to_string(),
        ..ServerConfig::default()
    }
}

/// Starts a server on an ephemeral localhost port.
pub async fn start_server() -> ServerApp {
    ServerApp::start(&local_config())
        .await
        .expect("test server should start")
}

/// Starts a server on an ephemeral localhost port backed by `repository`.
pub async fn start_server_with(repository: SharedRepository) -> ServerApp {
    ServerApp::start_with_repository(&local_config(), repository)
        .await
        .expect("test server should start")
}

pub fn url(app: &ServerApp, path: &str) -> String {
    format!("http://{}{}", app.address(), path)
}
