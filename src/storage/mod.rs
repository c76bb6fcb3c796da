//! Persistent storage for visited points.
//!
//! The cache only talks to storage through [`PersistentStore`]: one bulk load
//! at warm-up and one batch insert per flush. Backends:
//! - `MemoryStore`: volatile, with failure injection for degraded-mode testing
//! - `SnapshotStore`: whole-set snapshot file (requires `snapshot` feature)
//! - `AppendLogStore`: append-only record log (requires `aof` feature)

use crate::error::Result;
use crate::point::GeoPoint;

#[cfg(feature = "aof")]
mod append_log;
mod memory;
#[cfg(feature = "snapshot")]
mod snapshot;

#[cfg(feature = "aof")]
pub use append_log::AppendLogStore;
pub use memory::MemoryStore;
#[cfg(feature = "snapshot")]
pub use snapshot::SnapshotStore;

/// Durable home of visited points.
///
/// Implementations synchronize internally; the cache shares one store between
/// the query path (warm-up) and the flush thread.
pub trait PersistentStore: Send + Sync {
    /// Every persisted point. Fails with `StorageUnavailable` if the medium cannot be read.
    fn load_all(&self) -> Result<Vec<GeoPoint>>;

    /// Persists a batch atomically. Fails with `StorageWriteFailed`, in which
    /// case none of the batch may be considered stored.
    fn insert_batch(&self, points: &[GeoPoint]) -> Result<()>;

    /// Forgets every persisted point.
    fn delete_all(&self) -> Result<()>;

    fn stats(&self) -> StorageStats;
}

/// Storage backend statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Points persisted, as of the last load or write
    pub point_count: usize,
    /// Successful batch writes
    pub batches_written: u64,
    /// Full loads served
    pub loads: u64,
    /// Size of the backing file in bytes, zero for memory
    pub size_bytes: u64,
}
