//! Configuration management for pcmetrics
//!
//! This module defines the `ServerConfig` and `AgentConfig` structs holding
//! every setting of the two binaries. Both are loaded with `figment` by
//! layering, from lowest to highest priority: built-in defaults, an optional
//! TOML file, `PCMETRICS_`-prefixed environment variables, command-line flags,
//! and finally the plain `ADDRESS` / `POLL_INTERVAL` / `REPORT_INTERVAL`
//! variables, which win whenever they are set.

use crate::cli::{AgentCli, ServerCli};
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map, Value},
    Error, Figment, Metadata, Profile, Provider,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "PCMETRICS_";

/// Settings for the metrics server.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// The logging level for the application.
    pub log_level: String,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    /// The address the HTTP server binds to.
    pub address: String,
    /// Self-telemetry exporter settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Settings for the collection agent.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AgentConfig {
    /// The logging level for the application.
    pub log_level: String,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    /// Base URL of the metrics server. A bare `host:port` is accepted.
    pub address: String,
    /// Seconds between runtime samples.
    pub poll_interval_seconds: u64,
    /// Seconds between reports to the server.
    pub report_interval_seconds: u64,
    /// Timeout for each report request in milliseconds.
    pub request_timeout_ms: u64,
    /// Self-telemetry exporter settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Configuration for the Prometheus self-telemetry endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct TelemetryConfig {
    /// Serve `/metrics` on this address. Disabled when unset.
    pub listen_address: Option<SocketAddr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            address: "localhost:8080".to_string(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            address: "http://localhost:8080".to_string(),
            poll_interval_seconds: 2,
            report_interval_seconds: 10,
            request_timeout_ms: 5000,
            telemetry: TelemetryConfig::default(),
        }
    }
}

fn base_figment<T: Serialize>(defaults: T, config_file: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(defaults));
    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }
    // e.g. PCMETRICS_LOG_LEVEL=debug, PCMETRICS_TELEMETRY__LISTEN_ADDRESS=127.0.0.1:9100
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

impl ServerConfig {
    /// Loads and validates the server configuration.
    pub fn load(cli: &ServerCli, env: &EnvOverrides) -> Result<Self> {
        let config: ServerConfig = base_figment(ServerConfig::default(), cli.config.as_deref())
            .merge(cli.clone())
            .merge(env.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            bail!("server address must not be empty");
        }
        Ok(())
    }
}

impl AgentConfig {
    /// Loads and validates the agent configuration.
    pub fn load(cli: &AgentCli, env: &EnvOverrides) -> Result<Self> {
        let config: AgentConfig = base_figment(AgentConfig::default(), cli.config.as_deref())
            .merge(cli.clone())
            .merge(env.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            bail!("server address must not be empty");
        }
        if self.poll_interval_seconds == 0 {
            bail!("poll interval must be at least one second");
        }
        if self.report_interval_seconds == 0 {
            bail!("report interval must be at least one second");
        }
        if self.request_timeout_ms == 0 {
            bail!("request timeout must be greater than zero");
        }
        Ok(())
    }

    /// Whether polls are less frequent than reports, which makes some
    /// reports resend unchanged values.
    pub fn poll_slower_than_report(&self) -> bool {
        self.poll_interval_seconds > self.report_interval_seconds
    }
}

// =============================================================================
// Plain environment overrides
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Text,
    Seconds,
}

const SERVER_ENV: &[(&str, &str, EnvKind)] = &[("ADDRESS", "address", EnvKind::Text)];

const AGENT_ENV: &[(&str, &str, EnvKind)] = &[
    ("ADDRESS", "address", EnvKind::Text),
    ("POLL_INTERVAL", "poll_interval_seconds", EnvKind::Seconds),
    ("REPORT_INTERVAL", "report_interval_seconds", EnvKind::Seconds),
];

/// The unprefixed environment variables, applied on top of every other
/// source.
///
/// Empty variables count as unset. Malformed values are dropped and kept in
/// [`EnvOverrides::rejected`] so the caller can log them once logging is up.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    values: Dict,
    rejected: Vec<String>,
}

impl EnvOverrides {
    /// Reads `ADDRESS` from the process environment.
    pub fn server() -> Self {
        Self::collect(SERVER_ENV, |name| std::env::var(name).ok())
    }

    /// Reads `ADDRESS`, `POLL_INTERVAL` and `REPORT_INTERVAL` from the
    /// process environment.
    pub fn agent() -> Self {
        Self::collect(AGENT_ENV, |name| std::env::var(name).ok())
    }

    /// Builds agent overrides from an arbitrary lookup, for tests.
    pub fn agent_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::collect(AGENT_ENV, lookup)
    }

    /// Builds server overrides from an arbitrary lookup, for tests.
    pub fn server_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::collect(SERVER_ENV, lookup)
    }

    fn collect<F>(vars: &[(&str, &str, EnvKind)], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = Self::default();
        for (var, key, kind) in vars {
            let Some(raw) = lookup(*var).filter(|v| !v.is_empty()) else {
                continue;
            };
            match kind {
                EnvKind::Text => {
                    overrides.values.insert(key.to_string(), Value::from(raw));
                }
                EnvKind::Seconds => match raw.trim().parse::<u64>() {
                    Ok(seconds) => {
                        overrides
                            .values
                            .insert(key.to_string(), Value::from(seconds));
                    }
                    Err(e) => overrides
                        .rejected
                        .push(format!("Invalid {} value {:?}: {}", var, raw, e)),
                },
            }
        }
        overrides
    }

    /// Messages for variables that were set but could not be parsed.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Provider for EnvOverrides {
    fn metadata(&self) -> Metadata {
        Metadata::named("Environment Overrides")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut map = Map::new();
        map.insert(Profile::Default, self.values.clone());
        Ok(map)
    }
}
