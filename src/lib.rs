//! Visited-area cache for exploration maps: a deduplicated in-memory point index
//! with batched background persistence.
//!
//! ```rust
//! use fogmap::{CacheBuilder, GeoPoint};
//!
//! let cache = CacheBuilder::new().auto_flush(false).build()?;
//! cache.insert(GeoPoint::new(10.0, 20.0))?;
//! cache.insert(GeoPoint::new(10.0, 20.0))?;
//! cache.insert(GeoPoint::new(30.0, 40.0))?;
//!
//! let visible = cache.select_visited(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(20.0, 30.0))?;
//! assert_eq!(visible, vec![GeoPoint::new(10.0, 20.0)]);
//!
//! assert_eq!(cache.flush_if_dirty()?, 2);
//! cache.destroy()?;
//! # Ok::<(), fogmap::FogmapError>(())
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod dirty;
pub mod error;
pub mod index;
pub mod point;
pub mod scheduler;
pub mod storage;

pub use builder::CacheBuilder;
pub use cache::{CacheState, CacheStats, VisitedAreaCache};
pub use config::Config;
pub use dirty::{DirtyBuffer, DirtySnapshot};
pub use error::{FogmapError, Result};
pub use index::VisitedIndex;
pub use point::{CellKey, GeoPoint, GridResolution, Viewport};
pub use scheduler::{FlushScheduler, TaskControl};

pub use storage::{MemoryStore, PersistentStore, StorageStats};

#[cfg(feature = "snapshot")]
pub use storage::SnapshotStore;

#[cfg(feature = "aof")]
pub use storage::AppendLogStore;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CacheBuilder, FogmapError, Result, VisitedAreaCache};

    pub use crate::{Config, GeoPoint, Viewport};

    pub use crate::{MemoryStore, PersistentStore};

    #[cfg(feature = "snapshot")]
    pub use crate::SnapshotStore;

    #[cfg(feature = "aof")]
    pub use crate::AppendLogStore;

    pub use std::time::Duration;
}
