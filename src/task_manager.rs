//! Manages the lifecycle of the long-running tasks of either binary.
use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Owns the shutdown signal and the handles of every spawned task.
///
/// Tasks subscribe to the signal through [`TaskManager::subscribe`] and are
/// expected to return once it flips to `true`.
#[derive(Debug)]
pub struct TaskManager {
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown_tx: watch::Sender<bool>,
}

impl TaskManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            handles: Vec::new(),
            shutdown_tx,
        }
    }

    /// Spawns a task and keeps its handle for shutdown.
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        self.handles.push((name, tokio::spawn(future)));
    }

    /// Returns a receiver for the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signals shutdown and waits for every managed task to finish.
    pub async fn shutdown(self) {
        self.shutdown_tx.send_replace(true);
        info!(
            "TaskManager shutting down. Waiting for {} tasks to complete...",
            self.handles.len()
        );

        let (names, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut panicked = 0;
        for (task_name, result) in names.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name, "Task shut down gracefully."),
                Err(e) => {
                    error!(task_name, "Task failed during shutdown: {}", e);
                    panicked += 1;
                }
            }
        }

        if panicked > 0 {
            error!("{} tasks failed during shutdown", panicked);
        } else {
            info!("All tasks shut down gracefully.");
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once the shutdown flag is `true` or its sender is gone.
pub async fn shutdown_signalled(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}
