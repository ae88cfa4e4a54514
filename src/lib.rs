//! pcmetrics - a minimal metrics collection pair
//!
//! The library holds everything both binaries share: the metric model and
//! repository contract, the in-memory storage, the HTTP server, the
//! collection agent, and the configuration, logging and telemetry plumbing.

pub mod agent;
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
pub mod server;
pub mod storage;
pub mod task_manager;
pub mod telemetry;

// Re-export core types for convenience
pub use crate::core::*;
