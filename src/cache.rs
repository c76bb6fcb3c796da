//! The visited-area cache.
//!
//! [`VisitedAreaCache`] coordinates three actors that share one index:
//! - ingestion calls [`insert`](VisitedAreaCache::insert) for every accepted fix
//! - rendering calls [`select_visited`](VisitedAreaCache::select_visited) on every viewport change
//! - a [`FlushScheduler`] periodically calls [`flush_if_dirty`](VisitedAreaCache::flush_if_dirty)
//!
//! All in-memory state sits behind one mutex that is never held across a call
//! into the [`PersistentStore`]. Flushes snapshot the dirty buffer, write the
//! snapshot with the lock released, and on success remove exactly the written
//! cells, so points inserted during a slow write are never lost.
//!
//! ```rust
//! use fogmap::{CacheBuilder, GeoPoint};
//!
//! let cache = CacheBuilder::new().auto_flush(false).build()?;
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

use crate::config::Config;
use crate::dirty::DirtyBuffer;
use crate::error::{FogmapError, Result};
use crate::index::VisitedIndex;
use crate::point::{GeoPoint, GridResolution, Viewport};
use crate::scheduler::{FlushScheduler, TaskControl};
use crate::storage::PersistentStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Lifecycle of a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing inserted or loaded yet.
    Uninitialized,
    /// Holds data; flushes are meaningful.
    Warm,
    /// Torn down. Every further operation fails with `CacheDestroyed`.
    Destroyed,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Points in the in-memory index
    pub indexed: usize,
    /// Points waiting for the next flush
    pub dirty: usize,
    pub warmed_up: bool,
    /// Flushes that wrote at least one point
    pub flushes: u64,
    pub failed_flushes: u64,
    pub points_persisted: u64,
    pub warm_ups: u64,
}

struct CacheData {
    index: VisitedIndex,
    dirty: DirtyBuffer,
    lifecycle: CacheState,
    warmed_up: bool,
    // Why the last load attempt failed; cleared by a successful load.
    warm_up_error: Option<String>,
}

impl CacheData {
    fn ensure_live(&self) -> Result<()> {
        if self.lifecycle == CacheState::Destroyed {
            return Err(FogmapError::CacheDestroyed);
        }
        Ok(())
    }

    fn touch(&mut self) {
        if self.lifecycle == CacheState::Uninitialized {
            self.lifecycle = CacheState::Warm;
        }
    }
}

#[derive(Default)]
struct Counters {
    flushes: AtomicU64,
    failed_flushes: AtomicU64,
    points_persisted: AtomicU64,
    warm_ups: AtomicU64,
}

struct CacheInner {
    data: Mutex<CacheData>,
    store: Arc<dyn PersistentStore>,
    config: Config,
    resolution: GridResolution,
    // Serializes flushes and `delete_all` against each other.
    flush_lock: Mutex<()>,
    // Serializes the one-time load so concurrent queries wait instead of loading twice.
    warm_up_lock: Mutex<()>,
    scheduler: Mutex<Option<FlushScheduler>>,
    counters: Counters,
}

/// In-memory, deduplicating index of visited points with batched persistence.
///
/// Cloning is cheap and yields another handle to the same cache, so one
/// instance can be handed to the ingestion and rendering sides alike.
#[derive(Clone)]
pub struct VisitedAreaCache {
    inner: Arc<CacheInner>,
}

impl VisitedAreaCache {
    /// Creates a cache over `store` and starts its flush timer.
    pub fn new(store: Arc<dyn PersistentStore>, config: Config) -> Result<Self> {
        let cache = Self::without_scheduler(store, config)?;
        cache.start_scheduler()?;
        Ok(cache)
    }

    /// Creates a cache with no flush timer; the caller drives `flush_if_dirty`.
    pub fn without_scheduler(store: Arc<dyn PersistentStore>, config: Config) -> Result<Self> {
        config.check()?;
        let resolution = config.resolution()?;

        Ok(Self {
            inner: Arc::new(CacheInner {
                data: Mutex::new(CacheData {
                    index: VisitedIndex::new(resolution),
                    dirty: DirtyBuffer::new(),
                    lifecycle: CacheState::Uninitialized,
                    warmed_up: false,
                    warm_up_error: None,
                }),
                store,
                config,
                resolution,
                flush_lock: Mutex::new(()),
                warm_up_lock: Mutex::new(()),
                scheduler: Mutex::new(None),
                counters: Counters::default(),
            }),
        })
    }

    pub fn builder() -> crate::builder::CacheBuilder {
        crate::builder::CacheBuilder::new()
    }

    fn start_scheduler(&self) -> Result<()> {
        let weak: Weak<CacheInner> = Arc::downgrade(&self.inner);
        let scheduler = FlushScheduler::start(self.inner.config.flush_interval(), move || {
            let Some(inner) = weak.upgrade() else {
                return TaskControl::Stop;
            };
            match (VisitedAreaCache { inner }).flush_if_dirty() {
                Ok(_) => TaskControl::Continue,
                Err(FogmapError::CacheDestroyed) => TaskControl::Stop,
                // Already logged; the buffer is kept for the next cycle.
                Err(_) => TaskControl::Continue,
            }
        })?;
        *self.inner.scheduler.lock() = Some(scheduler);
        Ok(())
    }

    /// Records a visited point and returns the index size.
    ///
    /// Equivalent points are cheap no-ops. Never touches storage.
    pub fn insert(&self, point: GeoPoint) -> Result<usize> {
        let mut data = self.inner.data.lock();
        data.ensure_live()?;
        data.touch();

        if data.index.insert(point) {
            data.dirty.mark(point.cell(self.inner.resolution), point);
            log::trace!(
                "New visited point ({}, {})",
                point.latitude,
                point.longitude
            );
        }
        Ok(data.index.len())
    }

    /// Visited points inside the rectangle spanned by two viewport corners.
    ///
    /// The first call loads every persisted point. If that load fails the query
    /// is answered from the points inserted this session and the next call
    /// tries the load again; see [`last_warm_up_error`](Self::last_warm_up_error).
    /// Corners that do not form a rectangle yield an empty result. The only
    /// error is `CacheDestroyed`.
    pub fn select_visited(
        &self,
        upper_left: &GeoPoint,
        lower_right: &GeoPoint,
    ) -> Result<Vec<GeoPoint>> {
        self.inner.data.lock().ensure_live()?;
        match Viewport::from_corners(upper_left, lower_right) {
            Ok(viewport) => self.select_visited_in(&viewport),
            Err(e) => {
                log::debug!("Ignoring viewport query: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Visited points inside `viewport`, warming up first if needed.
    pub fn select_visited_in(&self, viewport: &Viewport) -> Result<Vec<GeoPoint>> {
        self.warm_up_or_degrade()?;

        let data = self.inner.data.lock();
        data.ensure_live()?;
        let visited = data.index.range_query(viewport);
        log::debug!("Returning {} cached results", visited.len());
        Ok(visited)
    }

    /// Every visited point. Loads persisted points first only while the index
    /// is still empty.
    pub fn select_all(&self) -> Result<Vec<GeoPoint>> {
        let needs_load = {
            let data = self.inner.data.lock();
            data.ensure_live()?;
            data.index.is_empty() && !data.warmed_up
        };
        if needs_load {
            self.warm_up_or_degrade()?;
        }

        let data = self.inner.data.lock();
        data.ensure_live()?;
        Ok(data.index.all())
    }

    // Storage trouble never hides in-memory points from readers.
    fn warm_up_or_degrade(&self) -> Result<()> {
        match self.warm_up() {
            Err(FogmapError::CacheDestroyed) => Err(FogmapError::CacheDestroyed),
            Err(e) => {
                log::debug!("Serving in-memory points only: {}", e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Loads the persisted set into the index unless that already happened.
    ///
    /// On `StorageUnavailable` nothing changes except the recorded
    /// [`last_warm_up_error`](Self::last_warm_up_error), and the next call retries.
    pub fn warm_up(&self) -> Result<()> {
        if self.is_warmed_up() {
            return Ok(());
        }

        let _loading = self.inner.warm_up_lock.lock();
        {
            let data = self.inner.data.lock();
            data.ensure_live()?;
            if data.warmed_up {
                return Ok(());
            }
        }

        let persisted = match self.inner.store.load_all() {
            Ok(points) => points,
            Err(e) => {
                let e = match e {
                    FogmapError::StorageUnavailable(_) => e,
                    other => FogmapError::unavailable(other),
                };
                log::warn!("Warm-up failed, serving in-memory points only: {}", e);
                self.inner.data.lock().warm_up_error = Some(e.to_string());
                return Err(e);
            }
        };

        let mut data = self.inner.data.lock();
        data.ensure_live()?;
        if data.warmed_up {
            // Settled already, for example by `delete_all`.
            return Ok(());
        }
        let loaded = persisted.len();
        let mut added = 0;
        for point in persisted {
            let key = point.cell(self.inner.resolution);
            if data.index.insert(point) {
                added += 1;
            }
            // Already durable, no need to write it again.
            data.dirty.discard(&key);
        }
        data.warmed_up = true;
        data.warm_up_error = None;
        data.touch();
        self.inner.counters.warm_ups.fetch_add(1, Ordering::Relaxed);

        log::info!(
            "Loaded {} persisted points ({} new), index holds {}",
            loaded,
            added,
            data.index.len()
        );
        Ok(())
    }

    /// Writes pending points to the store as one batch.
    ///
    /// Returns how many points were persisted, zero when nothing was pending.
    /// On `StorageWriteFailed` the points stay pending and are retried, along
    /// with anything inserted meanwhile, on the next call.
    ///
    /// A cache that has not loaded the persisted set yet loads it first, so
    /// cells already in the store are not written twice.
    pub fn flush_if_dirty(&self) -> Result<usize> {
        let load_first = {
            let data = self.inner.data.lock();
            data.ensure_live()?;
            !data.warmed_up && !data.dirty.is_empty()
        };
        if load_first {
            // A failed load is already logged; write what is pending anyway.
            self.warm_up_or_degrade()?;
        }

        let _flushing = self.inner.flush_lock.lock();

        let snapshot = {
            let data = self.inner.data.lock();
            data.ensure_live()?;
            if data.dirty.is_empty() {
                log::trace!("No new locations, no update needed");
                return Ok(0);
            }
            data.dirty.snapshot()
        };

        log::debug!("Updating store with {} new locations", snapshot.len());
        if let Err(e) = self.inner.store.insert_batch(snapshot.points()) {
            self.inner
                .counters
                .failed_flushes
                .fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "Flush of {} locations failed, retrying next cycle: {}",
                snapshot.len(),
                e
            );
            return Err(match e {
                FogmapError::StorageWriteFailed(_) => e,
                other => FogmapError::write_failed(other),
            });
        }

        let remaining = {
            let mut data = self.inner.data.lock();
            data.dirty.acknowledge(&snapshot);
            data.dirty.len()
        };

        let counters = &self.inner.counters;
        counters.flushes.fetch_add(1, Ordering::Relaxed);
        counters
            .points_persisted
            .fetch_add(snapshot.len() as u64, Ordering::Relaxed);
        log::debug!(
            "Store update completed, {} locations arrived during the write",
            remaining
        );
        Ok(snapshot.len())
    }

    /// Forgets every visited point, in memory and in the store.
    pub fn delete_all(&self) -> Result<()> {
        let _loading = self.inner.warm_up_lock.lock();
        let _flushing = self.inner.flush_lock.lock();
        self.inner.data.lock().ensure_live()?;

        self.inner.store.delete_all()?;

        let mut data = self.inner.data.lock();
        data.ensure_live()?;
        data.index.clear();
        data.dirty.clear();
        // The store is empty now, there is nothing left to load.
        data.warmed_up = true;
        data.warm_up_error = None;
        log::info!("Deleted all visited points");
        Ok(())
    }

    /// Ends the session: stops the flush timer, makes one final flush and
    /// discards the in-memory state.
    ///
    /// Once this returns no scheduled flush will run. The cache is unusable
    /// afterwards and must be rebuilt. If the final flush fails the teardown
    /// still completes and the write error is returned. Repeated calls are no-ops.
    pub fn destroy(&self) -> Result<()> {
        let scheduler = self.inner.scheduler.lock().take();
        if let Some(mut scheduler) = scheduler {
            scheduler.cancel();
        }

        if self.state() == CacheState::Destroyed {
            return Ok(());
        }

        let final_flush = if self.inner.config.final_flush_on_destroy {
            match self.flush_if_dirty() {
                Err(FogmapError::CacheDestroyed) => Ok(0),
                other => other,
            }
        } else {
            Ok(0)
        };

        let mut data = self.inner.data.lock();
        if data.lifecycle == CacheState::Destroyed {
            return Ok(());
        }
        let dropped = data.dirty.len();
        data.index.clear();
        data.dirty.clear();
        data.warmed_up = false;
        data.lifecycle = CacheState::Destroyed;
        drop(data);

        if dropped > 0 {
            log::warn!("Cache destroyed with {} unpersisted locations", dropped);
        } else {
            log::info!("Cache destroyed");
        }
        final_flush.map(|_| ())
    }

    pub fn len(&self) -> usize {
        self.inner.data.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.data.lock().index.is_empty()
    }

    pub fn dirty_len(&self) -> usize {
        self.inner.data.lock().dirty.len()
    }

    /// Copy of the points waiting for the next flush.
    pub fn dirty_points(&self) -> Vec<GeoPoint> {
        self.inner.data.lock().dirty.points()
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.inner.data.lock().index.contains(point)
    }

    pub fn is_warmed_up(&self) -> bool {
        self.inner.data.lock().warmed_up
    }

    /// Why the most recent load of the persisted set failed, if it did and
    /// no load has succeeded since.
    pub fn last_warm_up_error(&self) -> Option<String> {
        self.inner.data.lock().warm_up_error.clone()
    }

    pub fn state(&self) -> CacheState {
        self.inner.data.lock().lifecycle
    }

    pub fn is_flush_scheduled(&self) -> bool {
        self.inner
            .scheduler
            .lock()
            .as_ref()
            .is_some_and(FlushScheduler::is_running)
    }

    pub fn resolution(&self) -> GridResolution {
        self.inner.resolution
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.inner.store
    }

    pub fn stats(&self) -> CacheStats {
        let (indexed, dirty, warmed_up) = {
            let data = self.inner.data.lock();
            (data.index.len(), data.dirty.len(), data.warmed_up)
        };
        let counters = &self.inner.counters;
        CacheStats {
            indexed,
            dirty,
            warmed_up,
            flushes: counters.flushes.load(Ordering::Relaxed),
            failed_flushes: counters.failed_flushes.load(Ordering::Relaxed),
            points_persisted: counters.points_persisted.load(Ordering::Relaxed),
            warm_ups: counters.warm_ups.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for VisitedAreaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitedAreaCache")
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for CacheInner {
    fn drop(&mut self) {
        if let Some(mut scheduler) = self.scheduler.get_mut().take() {
            scheduler.cancel();
        }

        let data = self.data.get_mut();
        if data.lifecycle == CacheState::Destroyed
            || data.dirty.is_empty()
            || !self.config.final_flush_on_destroy
        {
            return;
        }

        let snapshot = data.dirty.snapshot();
        match self.store.insert_batch(snapshot.points()) {
            Ok(()) => log::debug!("Flushed {} locations on drop", snapshot.len()),
            Err(e) => log::warn!(
                "Lost {} unpersisted locations on drop: {}",
                snapshot.len(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::time::Duration;

    fn manual(store: &Arc<MemoryStore>) -> VisitedAreaCache {
        VisitedAreaCache::without_scheduler(store.clone(), Config::default()).unwrap()
    }

    #[test]
    fn test_insert_counts_distinct_cells() {
        let store = Arc::new(MemoryStore::new());
        let cache = manual(&store);
        assert_eq!(cache.state(), CacheState::Uninitialized);

        assert_eq!(cache.insert(GeoPoint::new(10.0, 20.0)).unwrap(), 1);
        assert_eq!(cache.insert(GeoPoint::new(10.0, 20.0)).unwrap(), 1);
        assert_eq!(cache.insert(GeoPoint::new(30.0, 40.0)).unwrap(), 2);
        assert_eq!(cache.dirty_len(), 2);
        assert_eq!(cache.state(), CacheState::Warm);
    }

    #[test]
    fn test_insert_never_touches_store() {
        let store = Arc::new(MemoryStore::new());
        store.fail_loads(true);
        store.fail_writes(true);
        let cache = manual(&store);
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();
        assert_eq!(store.load_count(), 0);
        assert!(store.batches().is_empty());
    }

    #[test]
    fn test_flush_clean_cache_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let cache = manual(&store);
        assert_eq!(cache.flush_if_dirty().unwrap(), 0);
        assert!(store.batches().is_empty());
    }

    #[test]
    fn test_warm_up_drops_already_persisted_cells_from_dirty() {
        let store = Arc::new(MemoryStore::with_points(vec![GeoPoint::new(5.0, 5.0)]));
        let cache = manual(&store);
        cache.insert(GeoPoint::new(5.0, 5.0)).unwrap();
        cache.insert(GeoPoint::new(6.0, 6.0)).unwrap();
        assert_eq!(cache.dirty_len(), 2);

        cache.warm_up().unwrap();
        assert_eq!(cache.dirty_points(), vec![GeoPoint::new(6.0, 6.0)]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_warm_up_is_retried() {
        let store = Arc::new(MemoryStore::with_points(vec![GeoPoint::new(5.0, 5.0)]));
        store.fail_loads(true);
        let cache = manual(&store);
        let everywhere = Viewport::new(-90.0, -180.0, 90.0, 180.0).unwrap();

        assert!(cache.select_visited_in(&everywhere).unwrap().is_empty());
        assert!(!cache.is_warmed_up());
        assert!(cache.last_warm_up_error().is_some());
        assert!(matches!(
            cache.warm_up(),
            Err(FogmapError::StorageUnavailable(_))
        ));

        store.fail_loads(false);
        assert_eq!(cache.select_visited_in(&everywhere).unwrap().len(), 1);
        assert!(cache.is_warmed_up());
        assert!(cache.last_warm_up_error().is_none());
    }

    #[test]
    fn test_queries_serve_session_points_while_storage_is_down() {
        let store = Arc::new(MemoryStore::with_points(vec![GeoPoint::new(1.5, 1.5)]));
        store.fail_loads(true);
        let cache = manual(&store);
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();

        for _ in 0..3 {
            let visible = cache
                .select_visited(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(2.0, 2.0))
                .unwrap();
            assert_eq!(visible, vec![GeoPoint::new(1.0, 1.0)]);
        }
        assert!(!cache.is_warmed_up());

        store.fail_loads(false);
        let visible = cache
            .select_visited(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(2.0, 2.0))
            .unwrap();
        assert_eq!(visible.len(), 2);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn test_flush_before_first_query_skips_stored_cells() {
        let store = Arc::new(MemoryStore::with_points(vec![GeoPoint::new(5.0, 5.0)]));
        let cache = manual(&store);
        cache.insert(GeoPoint::new(5.0, 5.0)).unwrap();
        cache.insert(GeoPoint::new(6.0, 6.0)).unwrap();

        assert_eq!(cache.flush_if_dirty().unwrap(), 1);
        assert_eq!(
            store.points(),
            vec![GeoPoint::new(5.0, 5.0), GeoPoint::new(6.0, 6.0)]
        );
        assert!(cache.is_warmed_up());
    }

    #[test]
    fn test_flush_still_writes_when_load_fails() {
        let store = Arc::new(MemoryStore::new());
        store.fail_loads(true);
        let cache = manual(&store);
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();

        assert_eq!(cache.flush_if_dirty().unwrap(), 1);
        assert_eq!(store.points(), vec![GeoPoint::new(1.0, 1.0)]);
        assert!(!cache.is_warmed_up());
    }

    #[test]
    fn test_invalid_bound_returns_empty() {
        let store = Arc::new(MemoryStore::new());
        let cache = manual(&store);
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();
        let result = cache
            .select_visited(&GeoPoint::new(f64::NAN, 0.0), &GeoPoint::new(2.0, 2.0))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_destroyed_cache_rejects_operations() {
        let store = Arc::new(MemoryStore::new());
        let cache = manual(&store);
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();
        cache.destroy().unwrap();

        assert_eq!(cache.state(), CacheState::Destroyed);
        assert!(cache.is_empty());
        assert!(matches!(
            cache.insert(GeoPoint::new(2.0, 2.0)),
            Err(FogmapError::CacheDestroyed)
        ));
        assert!(matches!(
            cache.flush_if_dirty(),
            Err(FogmapError::CacheDestroyed)
        ));
        assert!(matches!(
            cache.select_all(),
            Err(FogmapError::CacheDestroyed)
        ));
        assert!(cache.destroy().is_ok());
    }

    #[test]
    fn test_destroy_flushes_pending_points() {
        let store = Arc::new(MemoryStore::new());
        let cache = manual(&store);
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();
        cache.destroy().unwrap();
        assert_eq!(store.points(), vec![GeoPoint::new(1.0, 1.0)]);
    }

    #[test]
    fn test_destroy_without_final_flush() {
        let store = Arc::new(MemoryStore::new());
        let config = Config::default().with_final_flush_on_destroy(false);
        let cache = VisitedAreaCache::without_scheduler(store.clone(), config).unwrap();
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();
        cache.destroy().unwrap();
        assert!(store.points().is_empty());
    }

    #[test]
    fn test_destroy_reports_failed_final_flush() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let cache = manual(&store);
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();
        assert!(matches!(
            cache.destroy(),
            Err(FogmapError::StorageWriteFailed(_))
        ));
        assert_eq!(cache.state(), CacheState::Destroyed);
    }

    #[test]
    fn test_drop_flushes_pending_points() {
        let store = Arc::new(MemoryStore::new());
        {
            let cache = VisitedAreaCache::new(
                store.clone(),
                Config::default().with_flush_interval(Duration::from_secs(3600)),
            )
            .unwrap();
            cache.insert(GeoPoint::new(3.0, 3.0)).unwrap();
        }
        assert_eq!(store.points(), vec![GeoPoint::new(3.0, 3.0)]);
    }

    #[test]
    fn test_delete_all_clears_memory_and_store() {
        let store = Arc::new(MemoryStore::with_points(vec![GeoPoint::new(5.0, 5.0)]));
        let cache = manual(&store);
        cache.insert(GeoPoint::new(6.0, 6.0)).unwrap();
        cache.delete_all().unwrap();

        assert!(cache.is_empty());
        assert_eq!(cache.dirty_len(), 0);
        assert!(store.points().is_empty());
        assert!(cache.select_all().unwrap().is_empty());
        assert_eq!(store.load_count(), 0);
    }

    #[test]
    fn test_stats() {
        let store = Arc::new(MemoryStore::new());
        let cache = manual(&store);
        cache.insert(GeoPoint::new(1.0, 1.0)).unwrap();
        cache.insert(GeoPoint::new(2.0, 2.0)).unwrap();
        cache.flush_if_dirty().unwrap();
        cache.warm_up().unwrap();

        let stats = cache.stats();
        assert_eq!(stats.indexed, 2);
        assert_eq!(stats.dirty, 0);
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.points_persisted, 2);
        assert_eq!(stats.warm_ups, 1);
        assert!(stats.warmed_up);
    }
}
