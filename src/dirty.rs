//! Points accepted into the index but not yet persisted.

use crate::point::{CellKey, GeoPoint};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Pending points keyed by cell, in index order.
#[derive(Debug, Default, Clone)]
pub struct DirtyBuffer {
    points: BTreeMap<CellKey, GeoPoint>,
}

/// Point-in-time copy of the buffer handed to the store.
#[derive(Debug, Clone)]
pub struct DirtySnapshot {
    keys: Vec<CellKey>,
    points: Vec<GeoPoint>,
}

impl DirtySnapshot {
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl DirtyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the cell was already pending.
    pub fn mark(&mut self, key: CellKey, point: GeoPoint) -> bool {
        match self.points.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(point);
                true
            }
        }
    }

    pub fn snapshot(&self) -> DirtySnapshot {
        let (keys, points) = self.points.iter().map(|(k, p)| (*k, *p)).unzip();
        DirtySnapshot { keys, points }
    }

    /// Drops exactly the cells captured by `snapshot`; anything marked after it stays.
    pub fn acknowledge(&mut self, snapshot: &DirtySnapshot) -> usize {
        snapshot
            .keys
            .iter()
            .filter(|key| self.points.remove(key).is_some())
            .count()
    }

    /// Drops a single pending cell, e.g. one found to be persisted already.
    pub fn discard(&mut self, key: &CellKey) -> bool {
        self.points.remove(key).is_some()
    }

    pub fn points(&self) -> Vec<GeoPoint> {
        self.points.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::GridResolution;

    fn entry(lat: f64, lon: f64) -> (CellKey, GeoPoint) {
        let point = GeoPoint::new(lat, lon);
        (point.cell(GridResolution::default()), point)
    }

    #[test]
    fn test_mark_deduplicates() {
        let mut dirty = DirtyBuffer::new();
        let (key, point) = entry(1.0, 2.0);
        assert!(dirty.mark(key, point));
        assert!(!dirty.mark(key, point));
        assert_eq!(dirty.len(), 1);
    }

    #[test]
    fn test_acknowledge_keeps_points_marked_after_snapshot() {
        let mut dirty = DirtyBuffer::new();
        let (ka, a) = entry(1.0, 1.0);
        let (kb, b) = entry(2.0, 2.0);
        dirty.mark(ka, a);

        let snapshot = dirty.snapshot();
        dirty.mark(kb, b);

        assert_eq!(dirty.acknowledge(&snapshot), 1);
        assert_eq!(dirty.points(), vec![b]);
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let mut dirty = DirtyBuffer::new();
        for (k, p) in [entry(3.0, 0.0), entry(1.0, 0.0), entry(2.0, 0.0)] {
            dirty.mark(k, p);
        }
        let lats: Vec<f64> = dirty.snapshot().points().iter().map(|p| p.latitude).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0]);
    }
}
