//! Command-Line Interface (CLI) argument parsing.
//!
//! Both binaries parse their flags with `clap`. The parsed structs act as
//! `figment` providers, so only the flags actually given override values from
//! the configuration file and prefixed environment.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Stores gauges and counters pushed by metric agents and serves them over HTTP.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerCli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to.
    #[arg(short = 'a', long, value_name = "HOST:PORT")]
    pub address: Option<String>,

    /// Log level filter (e.g. "info", "debug").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Serve Prometheus self-telemetry on this address.
    #[arg(long, value_name = "HOST:PORT")]
    pub telemetry_address: Option<SocketAddr>,
}

/// Samples runtime statistics and reports them to a metrics server.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct AgentCli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the metrics server.
    #[arg(short = 'a', long, value_name = "URL")]
    pub address: Option<String>,

    /// Poll interval in seconds.
    #[arg(short = 'p', long, value_name = "SECONDS")]
    pub poll_interval: Option<u64>,

    /// Report interval in seconds.
    #[arg(short = 'r', long, value_name = "SECONDS")]
    pub report_interval: Option<u64>,

    /// Timeout for each report request in milliseconds.
    #[arg(long, value_name = "MS")]
    pub request_timeout_ms: Option<u64>,

    /// Log level filter (e.g. "info", "debug").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Serve Prometheus self-telemetry on this address.
    #[arg(long, value_name = "HOST:PORT")]
    pub telemetry_address: Option<SocketAddr>,
}

fn insert_common(
    dict: &mut Dict,
    log_level: &Option<String>,
    log_file: &Option<PathBuf>,
    telemetry_address: &Option<SocketAddr>,
) {
    if let Some(level) = log_level {
        dict.insert("log_level".into(), Value::from(level.clone()));
    }
    if let Some(path) = log_file {
        dict.insert(
            "log_file".into(),
            Value::from(path.to_string_lossy().into_owned()),
        );
    }
    if let Some(addr) = telemetry_address {
        let mut telemetry = Dict::new();
        telemetry.insert("listen_address".into(), Value::from(addr.to_string()));
        dict.insert("telemetry".into(), Value::from(telemetry));
    }
}

fn single_profile(dict: Dict) -> Map<Profile, Dict> {
    let mut map = Map::new();
    map.insert(Profile::Default, dict);
    map
}

impl Provider for ServerCli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();
        if let Some(address) = &self.address {
            dict.insert("address".into(), Value::from(address.clone()));
        }
        insert_common(
            &mut dict,
            &self.log_level,
            &self.log_file,
            &self.telemetry_address,
        );
        Ok(single_profile(dict))
    }
}

impl Provider for AgentCli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();
        if let Some(address) = &self.address {
            dict.insert("address".into(), Value::from(address.clone()));
        }
        if let Some(seconds) = self.poll_interval {
            dict.insert("poll_interval_seconds".into(), Value::from(seconds));
        }
        if let Some(seconds) = self.report_interval {
            dict.insert("report_interval_seconds".into(), Value::from(seconds));
        }
        if let Some(ms) = self.request_timeout_ms {
            dict.insert("request_timeout_ms".into(), Value::from(ms));
        }
        insert_common(
            &mut dict,
            &self.log_level,
            &self.log_file,
            &self.telemetry_address,
        );
        Ok(single_profile(dict))
    }
}
