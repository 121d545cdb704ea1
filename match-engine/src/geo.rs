//! Geospatial primitives: validated coordinates and great-circle distance.
//!
//! Backing stores answer proximity queries approximately (bounding-box
//! first), so every consumer re-checks candidates here with the exact
//! haversine distance before trusting them. Spherical-earth error is
//! ~0.5%, fine at city scale.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Quantization grid for cache keys: 1e-4 degrees, roughly an 11 m cell.
/// Coarse enough that float jitter in request coordinates lands on the
/// same cell, fine enough that hub resolution stays accurate.
const QUANTIZE_SCALE: f64 = 10_000.0;

/// Error returned when constructing an invalid coordinate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidPoint {
    reason: &'static str,
}

/// A validated WGS84 coordinate.
///
/// Latitude is in [-90, 90], longitude in [-180, 180], both finite.
/// Any `Point` value is valid by construction.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct Point {
    lat: f64,
    lon: f64,
}

/// Serde surface for `Point`, so deserialized coordinates still go
/// through validation.
#[derive(Serialize, Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawPoint> for Point {
    type Error = InvalidPoint;

    fn try_from(raw: RawPoint) -> Result<Self, InvalidPoint> {
        Point::new(raw.lat, raw.lon)
    }
}

impl From<Point> for RawPoint {
    fn from(p: Point) -> Self {
        RawPoint {
            lat: p.lat,
            lon: p.lon,
        }
    }
}

impl Point {
    /// Construct a point, validating ranges.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidPoint> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(InvalidPoint {
                reason: "coordinates must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidPoint {
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidPoint {
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Snap to the cache-key grid. Two requests within ~11 m of each
    /// other quantize to the same cell and share cache entries.
    pub fn quantize(&self) -> (i32, i32) {
        (
            (self.lat * QUANTIZE_SCALE).round() as i32,
            (self.lon * QUANTIZE_SCALE).round() as i32,
        )
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({:.5}, {:.5})", self.lat, self.lon)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lon)
    }
}

/// Great-circle (haversine) distance between two points, in meters.
pub fn distance_meters(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Whether `p` lies within `radius_m` meters of `center` by exact distance.
pub fn within(p: Point, center: Point, radius_m: f64) -> bool {
    distance_meters(p, center) <= radius_m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn reject_out_of_range() {
        assert!(Point::new(90.1, 0.0).is_err());
        assert!(Point::new(-90.1, 0.0).is_err());
        assert!(Point::new(0.0, 180.1).is_err());
        assert!(Point::new(0.0, -180.1).is_err());
        assert!(Point::new(f64::NAN, 0.0).is_err());
        assert!(Point::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn accept_boundaries() {
        assert!(Point::new(90.0, 180.0).is_ok());
        assert!(Point::new(-90.0, -180.0).is_ok());
        assert!(Point::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn same_point_zero_distance() {
        let p = point(6.5244, 3.3792);
        assert!(distance_meters(p, p) < 0.001);
    }

    #[test]
    fn known_distance_lagos() {
        // Ikeja (6.6018, 3.3515) to Lagos Island (6.4541, 3.3947):
        // roughly 17 km.
        let ikeja = point(6.6018, 3.3515);
        let island = point(6.4541, 3.3947);
        let d = distance_meters(ikeja, island);
        assert!((16_000.0..19_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn within_respects_radius() {
        let center = point(6.5244, 3.3792);
        // ~0.001 deg latitude is ~111 m.
        let near = point(6.5254, 3.3792);
        assert!(within(near, center, 200.0));
        assert!(!within(near, center, 50.0));
    }

    #[test]
    fn quantize_groups_nearby_points() {
        let a = point(6.52441, 3.37919);
        let b = point(6.52439, 3.37921);
        assert_eq!(a.quantize(), b.quantize());

        let far = point(6.5344, 3.3792);
        assert_ne!(a.quantize(), far.quantize());
    }

    #[test]
    fn serde_roundtrip_validates() {
        let p = point(6.5244, 3.3792);
        let json = serde_json::to_string(&p).unwrap();
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);

        // Out-of-range coordinates fail deserialization.
        let bad: Result<Point, _> = serde_json::from_str(r#"{"lat":91.0,"lon":0.0}"#);
        assert!(bad.is_err());
    }
}
