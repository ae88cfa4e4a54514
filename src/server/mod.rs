//! # Metrics Server
//!
//! This module defines the `HttpServer`, an `axum`-based web server that
//! accepts metric updates from agents and exposes the stored values.
//!
//! The server binds its listener up front, so bind failures surface at
//! startup, and runs until the shutdown signal from the task manager fires.

pub mod error;
pub mod handlers;
pub mod router;

use crate::core::MetricsRepository;
use crate::task_manager::shutdown_signalled;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

pub use error::ApiError;
pub use router::build_router;

/// The repository handle shared by every request handler.
pub type SharedRepository = Arc<dyn MetricsRepository>;

/// The metrics HTTP server.
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
}

impl HttpServer {
    /// Binds `address` and prepares the router, but does not start serving.
    pub async fn bind(
        address: &str,
        repo: SharedRepository,
        shutdown_rx: watch::Receiver<bool>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            router: build_router(repo),
            shutdown_rx,
        })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a future that serves requests until shutdown is signalled.
    pub fn run(self) -> impl Future<Output = ()> {
        let Self {
            listener,
            router,
            mut shutdown_rx,
        } = self;

        async move {
            let shutdown = async move {
                shutdown_signalled(&mut shutdown_rx).await;
                info!("Metrics server received shutdown signal.");
            };

            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("Metrics server error: {}", e);
            }
            info!("Metrics server task finished.");
        }
    }
}
