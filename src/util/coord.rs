use crate::core::constants::E6_SCALE;
use geo_types::Point;
use serde::{Deserialize, Serialize};

/// Anything that can hand out an `(x, y)` = `(lon, lat)` pair in degrees.
pub trait Coordinate {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
}

impl Coordinate for (f64, f64) {
    fn x(&self) -> f64 { self.0 }
    fn y(&self) -> f64 { self.1 }
}

impl Coordinate for Point<f64> {
    fn x(&self) -> f64 { Point::x(*self) }
    fn y(&self) -> f64 { Point::y(*self) }
}

/// Converts degrees to E6 units, rounding to the nearest micro-degree.
pub fn degrees_to_e6(degrees: f64) -> i64 {
    (degrees * E6_SCALE as f64).round() as i64
}

/// Converts E6 units back to degrees.
pub fn e6_to_degrees(value_e6: i64) -> f64 {
    value_e6 as f64 / E6_SCALE as f64
}

/// A latitude/longitude pair stored as integers scaled by 1e6.
///
/// Integer storage keeps comparisons and grid bucketing exact and
/// reproducible across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedGeoCoordinate {
    pub lat_e6: i64,
    pub lon_e6: i64,
}

impl FixedGeoCoordinate {
    pub fn new(lat_e6: i64, lon_e6: i64) -> Self {
        Self { lat_e6, lon_e6 }
    }

    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat_e6: degrees_to_e6(lat),
            lon_e6: degrees_to_e6(lon),
        }
    }

    /// Builds a fixed coordinate from any lon/lat [`Coordinate`].
    pub fn from_coordinate<C: Coordinate>(coord: &C) -> Self {
        Self::from_degrees(coord.y(), coord.x())
    }

    pub fn lat(&self) -> f64 {
        e6_to_degrees(self.lat_e6)
    }

    pub fn lon(&self) -> f64 {
        e6_to_degrees(self.lon_e6)
    }

    /// Returns the coordinate as a `geo_types::Point` with x = lon, y = lat.
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lon(), self.lat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_to_e6() {
        assert_eq!(degrees_to_e6(41.015137), 41_015_137);
        assert_eq!(degrees_to_e6(-0.000001), -1);
        assert_eq!(degrees_to_e6(0.0), 0);
    }

    #[test]
    fn test_e6_to_degrees() {
        assert!((e6_to_degrees(28_979_530) - 28.97953).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_trait_tuple() {
        let tuple = (28.97953, 41.015137);
        let fixed = FixedGeoCoordinate::from_coordinate(&tuple);
        assert_eq!(fixed.lon_e6, 28_979_530);
        assert_eq!(fixed.lat_e6, 41_015_137);
    }

    #[test]
    fn test_tuple_and_point_same_result() {
        let from_tuple = FixedGeoCoordinate::from_coordinate(&(28.97953, 41.015137));
        let from_point = FixedGeoCoordinate::from_coordinate(&Point::new(28.97953, 41.015137));
        assert_eq!(from_tuple, from_point);
    }

    #[test]
    fn test_to_point_axis_order() {
        let fixed = FixedGeoCoordinate::new(41_000_000, 29_000_000);
        let pt = fixed.to_point();
        assert!((pt.x() - 29.0).abs() < 1e-9);
        assert!((pt.y() - 41.0).abs() < 1e-9);
    }
}
