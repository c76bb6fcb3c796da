//! Visited points, the grid they are deduplicated on, and viewport bounds.
//!
//! A [`GeoPoint`] is a raw location fix. Two fixes are the same visited location
//! when they fall into the same grid cell, so equivalence and ordering are
//! expressed through a [`CellKey`] computed for a given [`GridResolution`]:
//!
//! ```rust
//! use fogmap::{GeoPoint, GridResolution};
//!
//! let res = GridResolution::default();
//! let a = GeoPoint::new(46.770_001, 23.590_001);
//! let b = GeoPoint::with_accuracy(46.770_004, 23.589_998, 12.0);
//! assert!(a.same_cell(&b, res));
//! ```

use crate::error::{FogmapError, Result};
use serde::{Deserialize, Serialize};

/// Meters spanned by one degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Default cell size in degrees, roughly 2.2 m.
pub const DEFAULT_RESOLUTION_DEGREES: f64 = 0.00002;

/// A visited coordinate.
///
/// Accuracy is carried along for consumers that want to draw a radius around
/// the point; it plays no part in ordering or deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl GeoPoint {
    /// Creates a point. Coordinates are not range checked.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    pub fn with_accuracy(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: Some(accuracy),
        }
    }

    /// Grid cell this point falls into at the given resolution.
    #[inline]
    pub fn cell(&self, resolution: GridResolution) -> CellKey {
        CellKey {
            lat: resolution.snap(self.latitude),
            lon: resolution.snap(self.longitude),
        }
    }

    /// Whether both points denote the same visited location.
    pub fn same_cell(&self, other: &GeoPoint, resolution: GridResolution) -> bool {
        self.cell(resolution) == other.cell(resolution)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

/// Size of a deduplication cell, in degrees on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridResolution(f64);

impl GridResolution {
    pub fn new(degrees: f64) -> Result<Self> {
        if !degrees.is_finite() || degrees <= 0.0 {
            return Err(FogmapError::InvalidInput(format!(
                "grid resolution must be a positive finite number of degrees, got {}",
                degrees
            )));
        }
        Ok(Self(degrees))
    }

    /// Resolution whose cells are roughly `meters` wide along a meridian.
    pub fn from_meters(meters: f64) -> Result<Self> {
        Self::new(meters / METERS_PER_DEGREE)
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }

    /// Approximate cell height in meters.
    pub fn meters(&self) -> f64 {
        self.0 * METERS_PER_DEGREE
    }

    // `as` saturates, so NaN lands in cell 0 and infinities in the outermost cells.
    #[inline]
    fn snap(&self, value: f64) -> i64 {
        (value / self.0).round() as i64
    }
}

impl Default for GridResolution {
    fn default() -> Self {
        Self(DEFAULT_RESOLUTION_DEGREES)
    }
}

/// Rounded coordinates of a point. Orders by latitude cell, then longitude cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub lat: i64,
    pub lon: i64,
}

impl CellKey {
    /// Smallest key in the given latitude cell.
    pub(crate) fn band_start(lat: i64) -> Self {
        Self { lat, lon: i64::MIN }
    }

    /// Largest key in the given latitude cell.
    pub(crate) fn band_end(lat: i64) -> Self {
        Self { lat, lon: i64::MAX }
    }
}

/// Axis-aligned latitude/longitude rectangle, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Viewport {
    /// Builds a rectangle from explicit bounds.
    ///
    /// Fails with [`FogmapError::InvalidBound`] when a bound is not finite or a
    /// minimum exceeds its maximum.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self> {
        let finite = [min_lat, min_lon, max_lat, max_lon]
            .iter()
            .all(|v| v.is_finite());
        if !finite || min_lat > max_lat || min_lon > max_lon {
            return Err(FogmapError::InvalidBound);
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Builds a rectangle from two opposite viewport corners.
    ///
    /// Screen corners map to different geographic corners depending on the
    /// projection, so the corners are normalized per axis rather than trusted
    /// to be north-west and south-east.
    pub fn from_corners(upper_left: &GeoPoint, lower_right: &GeoPoint) -> Result<Self> {
        // `f64::min` would silently drop a NaN corner.
        let finite = [upper_left, lower_right]
            .iter()
            .all(|p| p.latitude.is_finite() && p.longitude.is_finite());
        if !finite {
            return Err(FogmapError::InvalidBound);
        }
        Self::new(
            upper_left.latitude.min(lower_right.latitude),
            upper_left.longitude.min(lower_right.longitude),
            upper_left.latitude.max(lower_right.latitude),
            upper_left.longitude.max(lower_right.longitude),
        )
    }

    #[inline]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lon
            && point.longitude <= self.max_lon
    }
}

impl TryFrom<geo::Rect<f64>> for Viewport {
    type Error = FogmapError;

    fn try_from(rect: geo::Rect<f64>) -> Result<Self> {
        let (min, max) = (rect.min(), rect.max());
        Viewport::new(min.y, min.x, max.y, max.x)
    }
}

impl From<Viewport> for geo::Rect<f64> {
    fn from(viewport: Viewport) -> Self {
        geo::Rect::new(
            geo::coord! { x: viewport.min_lon, y: viewport.min_lat },
            geo::coord! { x: viewport.max_lon, y: viewport.max_lat },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_cell_within_resolution() {
        let res = GridResolution::new(0.001).unwrap();
        let a = GeoPoint::new(10.0, 20.0);
        let b = GeoPoint::new(10.0002, 19.9997);
        let c = GeoPoint::new(10.002, 20.0);
        assert!(a.same_cell(&b, res));
        assert!(!a.same_cell(&c, res));
    }

    #[test]
    fn test_accuracy_ignored_for_equivalence() {
        let res = GridResolution::default();
        let a = GeoPoint::new(45.0, 25.0);
        let b = GeoPoint::with_accuracy(45.0, 25.0, 40.0);
        assert_eq!(a.cell(res), b.cell(res));
    }

    #[test]
    fn test_cell_order_is_latitude_major() {
        let res = GridResolution::new(1.0).unwrap();
        let south_east = GeoPoint::new(1.0, 50.0).cell(res);
        let north_west = GeoPoint::new(2.0, -50.0).cell(res);
        let north_east = GeoPoint::new(2.0, 50.0).cell(res);
        assert!(south_east < north_west);
        assert!(north_west < north_east);
    }

    #[test]
    fn test_non_finite_coordinates_do_not_panic() {
        let res = GridResolution::default();
        let nan = GeoPoint::new(f64::NAN, f64::NAN).cell(res);
        assert_eq!(nan, CellKey { lat: 0, lon: 0 });
        let inf = GeoPoint::new(f64::INFINITY, f64::NEG_INFINITY).cell(res);
        assert_eq!(inf.lat, i64::MAX);
        assert_eq!(inf.lon, i64::MIN);
    }

    #[test]
    fn test_resolution_validation() {
        assert!(GridResolution::new(0.0).is_err());
        assert!(GridResolution::new(-1.0).is_err());
        assert!(GridResolution::new(f64::NAN).is_err());
        let res = GridResolution::from_meters(2.5).unwrap();
        assert!((res.meters() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_from_corners_normalizes() {
        let vp =
            Viewport::from_corners(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(20.0, 30.0)).unwrap();
        assert_eq!(vp.min_lat, 0.0);
        assert_eq!(vp.max_lat, 20.0);
        assert_eq!(vp.min_lon, 0.0);
        assert_eq!(vp.max_lon, 30.0);

        let flipped =
            Viewport::from_corners(&GeoPoint::new(20.0, 30.0), &GeoPoint::new(0.0, 0.0)).unwrap();
        assert_eq!(vp, flipped);
    }

    #[test]
    fn test_viewport_rejects_invalid_bounds() {
        assert!(matches!(
            Viewport::new(10.0, 0.0, 5.0, 1.0),
            Err(FogmapError::InvalidBound)
        ));
        assert!(matches!(
            Viewport::from_corners(&GeoPoint::new(f64::NAN, 0.0), &GeoPoint::new(1.0, 1.0)),
            Err(FogmapError::InvalidBound)
        ));
    }

    #[test]
    fn test_viewport_contains_is_inclusive() {
        let vp = Viewport::new(0.0, 0.0, 10.0, 10.0).unwrap();
        assert!(vp.contains(&GeoPoint::new(0.0, 10.0)));
        assert!(vp.contains(&GeoPoint::new(10.0, 0.0)));
        assert!(!vp.contains(&GeoPoint::new(10.000001, 5.0)));
    }

    #[test]
    fn test_geo_interop() {
        let p = GeoPoint::new(40.7128, -74.0060);
        let gp: geo::Point<f64> = p.into();
        assert_eq!(gp.x(), -74.0060);
        assert_eq!(gp.y(), 40.7128);
        assert_eq!(GeoPoint::from(gp), p);

        let rect: geo::Rect<f64> = Viewport::new(1.0, 2.0, 3.0, 4.0).unwrap().into();
        let back = Viewport::try_from(rect).unwrap();
        assert_eq!(back.min_lat, 1.0);
        assert_eq!(back.max_lon, 4.0);
    }
}
