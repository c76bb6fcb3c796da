//! Ordered, deduplicated index of visited points.

use crate::point::{CellKey, GeoPoint, GridResolution, Viewport};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Set of visited points keyed by grid cell.
///
/// The first point inserted into a cell stays as the cell's representative;
/// later fixes in the same cell are no-ops. Range queries test both axes
/// explicitly and only use the latitude-major key order to skip cells that
/// lie outside the latitude band.
#[derive(Debug, Clone)]
pub struct VisitedIndex {
    points: BTreeMap<CellKey, GeoPoint>,
    resolution: GridResolution,
}

impl VisitedIndex {
    pub fn new(resolution: GridResolution) -> Self {
        Self {
            points: BTreeMap::new(),
            resolution,
        }
    }

    pub fn resolution(&self) -> GridResolution {
        self.resolution
    }

    /// Inserts `point` unless its cell is already present. Returns whether the index grew.
    pub fn insert(&mut self, point: GeoPoint) -> bool {
        let key = point.cell(self.resolution);
        match self.points.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(point);
                true
            }
        }
    }

    /// Merges a batch of points, returning how many were new.
    pub fn extend<I: IntoIterator<Item = GeoPoint>>(&mut self, points: I) -> usize {
        points
            .into_iter()
            .filter(|point| self.insert(*point))
            .count()
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.points.contains_key(&point.cell(self.resolution))
    }

    /// Members whose latitude and longitude both lie inside `viewport`.
    pub fn range_query(&self, viewport: &Viewport) -> Vec<GeoPoint> {
        let first = CellKey::band_start(self.snap(viewport.min_lat));
        let last = CellKey::band_end(self.snap(viewport.max_lat));
        if first > last {
            return Vec::new();
        }

        self.points
            .range(first..=last)
            .map(|(_, point)| point)
            .filter(|point| viewport.contains(point))
            .copied()
            .collect()
    }

    /// Copy of every member, in index order.
    pub fn all(&self) -> Vec<GeoPoint> {
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

    fn snap(&self, latitude: f64) -> i64 {
        GeoPoint::new(latitude, 0.0).cell(self.resolution).lat
    }
}
