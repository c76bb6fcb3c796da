//! Cache builder for flexible configuration
//!
//! The session owner builds one cache, hands clones of it to the ingestion and
//! rendering sides, and calls `destroy` when the session ends.

use crate::cache::VisitedAreaCache;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{MemoryStore, PersistentStore};
#[cfg(any(feature = "snapshot", feature = "aof"))]
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where persisted points live.
enum StoreChoice {
    Memory,
    Custom(Arc<dyn PersistentStore>),
    #[cfg(feature = "snapshot")]
    Snapshot(PathBuf),
    #[cfg(feature = "aof")]
    AppendLog(PathBuf),
}

impl std::fmt::Debug for StoreChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreChoice::Memory => f.write_str("Memory"),
            StoreChoice::Custom(_) => f.write_str("Custom"),
            #[cfg(feature = "snapshot")]
            StoreChoice::Snapshot(path) => f.debug_tuple("Snapshot").field(path).finish(),
            #[cfg(feature = "aof")]
            StoreChoice::AppendLog(path) => f.debug_tuple("AppendLog").field(path).finish(),
        }
    }
}

/// Builder for a [`VisitedAreaCache`] and the store behind it.
#[derive(Debug)]
pub struct CacheBuilder {
    store: StoreChoice,
    config: Config,
    auto_flush: bool,
}

impl CacheBuilder {
    /// In-memory store, default configuration, flush timer enabled.
    pub fn new() -> Self {
        Self {
            store: StoreChoice::Memory,
            config: Config::default(),
            auto_flush: true,
        }
    }

    /// Use an existing store.
    pub fn store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.store = StoreChoice::Custom(store);
        self
    }

    /// Persist into a snapshot file at `path`.
    #[cfg(feature = "snapshot")]
    pub fn snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.store = StoreChoice::Snapshot(path.into());
        self
    }

    /// Persist into an append-only log at `path`.
    #[cfg(feature = "aof")]
    pub fn append_log_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.store = StoreChoice::AppendLog(path.into());
        self
    }

    /// Keep points in memory only.
    pub fn in_memory(mut self) -> Self {
        self.store = StoreChoice::Memory;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_flush_interval(interval);
        self
    }

    pub fn resolution_degrees(mut self, degrees: f64) -> Self {
        self.config = self.config.with_resolution_degrees(degrees);
        self
    }

    /// Disable to drive `flush_if_dirty` manually instead of on a timer.
    pub fn auto_flush(mut self, enabled: bool) -> Self {
        self.auto_flush = enabled;
        self
    }

    pub fn build(self) -> Result<VisitedAreaCache> {
        let store: Arc<dyn PersistentStore> = match self.store {
            StoreChoice::Memory => Arc::new(MemoryStore::new()),
            StoreChoice::Custom(store) => store,
            #[cfg(feature = "snapshot")]
            StoreChoice::Snapshot(path) => Arc::new(crate::storage::SnapshotStore::new(path)),
            #[cfg(feature = "aof")]
            StoreChoice::AppendLog(path) => Arc::new(crate::storage::AppendLogStore::open(path)?),
        };

        if self.auto_flush {
            VisitedAreaCache::new(store, self.config)
        } else {
            VisitedAreaCache::without_scheduler(store, self.config)
        }
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}
