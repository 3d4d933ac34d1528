use crate::core::geometry::create_cell_rect;
use crate::util::error::CityPulseError;
use crate::util::identifier::{decode_cell_key, generate_cell_key};
use geo_types::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Checks that a heatmap grid size is usable.
pub fn validate_grid_size(grid_size_e6: i64) -> Result<(), CityPulseError> {
    if grid_size_e6 <= 0 {
        return Err(CityPulseError::InvalidGridSize(grid_size_e6));
    }
    Ok(())
}

/// Converts an E6 coordinate pair to `(lat_bucket, lon_bucket)` indices.
///
/// Floor division, so a coordinate just south/west of the origin lands in
/// bucket `-1` rather than `0`.
pub fn point_to_bucket(
    lat_e6: i64,
    lon_e6: i64,
    grid_size_e6: i64,
) -> Result<(i64, i64), CityPulseError> {
    validate_grid_size(grid_size_e6)?;
    Ok((lat_e6.div_euclid(grid_size_e6), lon_e6.div_euclid(grid_size_e6)))
}

/// Converts bucket indices back to the E6 coordinate of the cell's south-west corner.
pub fn bucket_to_point(
    lat_bucket: i64,
    lon_bucket: i64,
    grid_size_e6: i64,
) -> Result<(i64, i64), CityPulseError> {
    validate_grid_size(grid_size_e6)?;
    Ok((
        lat_bucket.saturating_mul(grid_size_e6),
        lon_bucket.saturating_mul(grid_size_e6),
    ))
}

/// Identifies one heatmap cell. Serialized as `"<latBucket>_<lonBucket>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub lat_bucket: i64,
    pub lon_bucket: i64,
}

impl CellKey {
    pub fn new(lat_bucket: i64, lon_bucket: i64) -> Self {
        Self {
            lat_bucket,
            lon_bucket,
        }
    }

    /// The cell containing `(lat_e6, lon_e6)`. The caller guarantees `grid_size_e6 > 0`.
    pub(crate) fn containing(lat_e6: i64, lon_e6: i64, grid_size_e6: i64) -> Self {
        Self::new(lat_e6.div_euclid(grid_size_e6), lon_e6.div_euclid(grid_size_e6))
    }

    pub fn for_coordinate(
        lat_e6: i64,
        lon_e6: i64,
        grid_size_e6: i64,
    ) -> Result<Self, CityPulseError> {
        let (lat_bucket, lon_bucket) = point_to_bucket(lat_e6, lon_e6, grid_size_e6)?;
        Ok(Self::new(lat_bucket, lon_bucket))
    }

    /// South-west corner of the cell in E6 units, saturating at the `i64` range.
    pub fn origin_e6(&self, grid_size_e6: i64) -> (i64, i64) {
        (
            self.lat_bucket.saturating_mul(grid_size_e6),
            self.lon_bucket.saturating_mul(grid_size_e6),
        )
    }

    /// The cell extent in degrees, x = lon and y = lat.
    pub fn to_rect(&self, grid_size_e6: i64) -> Rect<f64> {
        let (lat_e6, lon_e6) = self.origin_e6(grid_size_e6);
        create_cell_rect(lat_e6, lon_e6, grid_size_e6)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&generate_cell_key(self.lat_bucket, self.lon_bucket))
    }
}

impl FromStr for CellKey {
    type Err = CityPulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat_bucket, lon_bucket) = decode_cell_key(s)?;
        Ok(Self::new(lat_bucket, lon_bucket))
    }
}

impl Serialize for CellKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_to_bucket_and_back() -> Result<(), CityPulseError> {
        let (lat_b, lon_b) = point_to_bucket(41_015_137, 28_979_530, 900)?;
        assert_eq!((lat_b, lon_b), (45_572, 32_199));

        let (lat_e6, lon_e6) = bucket_to_point(lat_b, lon_b, 900)?;
        assert!(lat_e6 <= 41_015_137 && 41_015_137 < lat_e6 + 900);
        assert!(lon_e6 <= 28_979_530 && 28_979_530 < lon_e6 + 900);
        Ok(())
    }

    #[test]
    fn test_bucket_edges() -> Result<(), CityPulseError> {
        assert_eq!(point_to_bucket(0, 899, 900)?, (0, 0));
        assert_eq!(point_to_bucket(900, 1800, 900)?, (1, 2));
        Ok(())
    }

    #[test]
    fn test_negative_coordinates_floor() -> Result<(), CityPulseError> {
        assert_eq!(point_to_bucket(-1, -900, 900)?, (-1, -1));
        assert_eq!(point_to_bucket(-901, -122_419_416, 900)?, (-2, -136_022));
        Ok(())
    }

    #[test]
    fn test_invalid_grid_size() {
        assert!(matches!(
            point_to_bucket(1, 1, 0),
            Err(CityPulseError::InvalidGridSize(0))
        ));
        assert!(bucket_to_point(1, 1, -5).is_err());
        assert!(CellKey::for_coordinate(1, 1, -900).is_err());
    }

    #[test]
    fn test_cell_key_string_form() -> Result<(), CityPulseError> {
        let key = CellKey::for_coordinate(-1, 28_979_530, 900)?;
        assert_eq!(key.to_string(), "-1_32199");
        assert_eq!("-1_32199".parse::<CellKey>()?, key);
        Ok(())
    }

    #[test]
    fn test_cell_key_serde() -> Result<(), serde_json::Error> {
        let key = CellKey::new(3, -4);
        let json = serde_json::to_string(&key)?;
        assert_eq!(json, "\"3_-4\"");
        let back: CellKey = serde_json::from_str(&json)?;
        assert_eq!(back, key);
        Ok(())
    }

    #[test]
    fn test_extreme_key_saturates() -> Result<(), CityPulseError> {
        let key: CellKey = format!("{}_{}", i64::MAX, i64::MIN).parse()?;
        assert_eq!(key.origin_e6(900), (i64::MAX, i64::MIN));
        assert_eq!(bucket_to_point(i64::MAX, i64::MIN, 900)?, (i64::MAX, i64::MIN));

        let rect = key.to_rect(900);
        assert!(rect.min().y.is_finite() && rect.max().x.is_finite());
        Ok(())
    }

    #[test]
    fn test_cell_rect() {
        let rect = CellKey::new(1, 2).to_rect(500_000);
        assert!((rect.min().y - 0.5).abs() < 1e-9);
        assert!((rect.min().x - 1.0).abs() < 1e-9);
        assert!((rect.max().y - 1.0).abs() < 1e-9);
        assert!((rect.max().x - 1.5).abs() < 1e-9);
    }
}
