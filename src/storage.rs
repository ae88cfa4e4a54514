//! In-memory metric storage.
//!
//! `MemStorage` is the authoritative holder of every gauge and counter on the
//! server. Both maps sit behind a single `RwLock`: reads are shared, updates
//! take the write lock. The lock is never held across an `.await`.

use crate::core::{MetricsListing, MetricsRepository, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct Maps {
    gauges: HashMap<String, f64>,
    counters: HashMap<String, i64>,
}

/// A process-lifetime, unbounded metric store.
#[derive(Debug, Default)]
pub struct MemStorage {
    maps: RwLock<Maps>,
}

impl MemStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Maps>, StorageError> {
        self.maps.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Maps>, StorageError> {
        self.maps.write().map_err(|_| StorageError::Poisoned)
    }
}

#[async_trait]
impl MetricsRepository for MemStorage {
    async fn update_gauge(&self, name: &str, value: f64) -> Result<(), StorageError> {
        debug!(name, value, "Updating gauge");
        self.write()?.gauges.insert(name.to_string(), value);
        Ok(())
    }

    async fn update_counter(&self, name: &str, delta: i64) -> Result<(), StorageError> {
        debug!(name, delta, "Updating counter");
        let mut maps = self.write()?;
        let total = maps.counters.entry(name.to_string()).or_insert(0);
        *total = total.saturating_add(delta);
        Ok(())
    }

    async fn get_gauge(&self, name: &str) -> Result<Option<f64>, StorageError> {
        let value = self.read()?.gauges.get(name).copied();
        debug!(name, found = value.is_some(), "Getting gauge");
        Ok(value)
    }

    async fn get_counter(&self, name: &str) -> Result<Option<i64>, StorageError> {
        let value = self.read()?.counters.get(name).copied();
        debug!(name, found = value.is_some(), "Getting counter");
        Ok(value)
    }

    async fn list_metrics(&self) -> Result<MetricsListing, StorageError> {
        let maps = self.read()?;
        debug!(
            gauges = maps.gauges.len(),
            counters = maps.counters.len(),
            "Listing all metrics"
        );
        Ok(MetricsListing {
            gauges: maps.gauges.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            counters: maps.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        })
    }
}
