//! In-memory store.

use super::{PersistentStore, StorageStats};
use crate::error::{FogmapError, Result};
use crate::point::GeoPoint;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Volatile store backed by a vector.
///
/// Writes and loads can be forced to fail, which lets callers exercise the
/// cache's retain-and-retry behavior without touching a real medium.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
    fail_loads: AtomicBool,
}

#[derive(Debug, Default)]
struct Inner {
    points: Vec<GeoPoint>,
    batches: Vec<Vec<GeoPoint>>,
    loads: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with previously persisted points.
    pub fn with_points(points: Vec<GeoPoint>) -> Self {
        let store = Self::new();
        store.inner.lock().points = points;
        store
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Every persisted point, in insertion order.
    pub fn points(&self) -> Vec<GeoPoint> {
        self.inner.lock().points.clone()
    }

    /// Successful batches, in the order they were written.
    pub fn batches(&self) -> Vec<Vec<GeoPoint>> {
        self.inner.lock().batches.clone()
    }

    pub fn load_count(&self) -> u64 {
        self.inner.lock().loads
    }
}

impl PersistentStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<GeoPoint>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(FogmapError::StorageUnavailable(
                "memory store configured to fail loads".into(),
            ));
        }
        let mut inner = self.inner.lock();
        inner.loads += 1;
        Ok(inner.points.clone())
    }

    fn insert_batch(&self, points: &[GeoPoint]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FogmapError::StorageWriteFailed(
                "memory store configured to fail writes".into(),
            ));
        }
        let mut inner = self.inner.lock();
        inner.points.extend_from_slice(points);
        inner.batches.push(points.to_vec());
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.points.clear();
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        let inner = self.inner.lock();
        StorageStats {
            point_count: inner.points.len(),
            batches_written: inner.batches.len() as u64,
            loads: inner.loads,
            size_bytes: 0,
        }
    }
}
