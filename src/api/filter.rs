use crate::api::hazard::HazardSnapshot;
use crate::core::constants::{E6_SCALE, MAX_BBOX_AREA_DEGREES, MAX_RISK_SCORE};
use crate::util::coord::e6_to_degrees;
use crate::util::error::CityPulseError;
use geo_types::{Coord, Rect};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Scales degrees to E6, snapping values that are within float noise of a
/// whole micro-degree before applying `round_fn`.
fn to_e6(degrees: f64, round_fn: fn(f64) -> f64) -> i64 {
    let raw = degrees * E6_SCALE as f64;
    let nearest = raw.round();
    if (raw - nearest).abs() < 1e-6 {
        nearest as i64
    } else {
        round_fn(raw) as i64
    }
}

/// Inclusive query window in E6 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat_e6: i64,
    pub min_lon_e6: i64,
    pub max_lat_e6: i64,
    pub max_lon_e6: i64,
}

impl BoundingBox {
    pub fn new(
        min_lat_e6: i64,
        min_lon_e6: i64,
        max_lat_e6: i64,
        max_lon_e6: i64,
    ) -> Result<Self, CityPulseError> {
        if min_lat_e6 >= max_lat_e6 || min_lon_e6 >= max_lon_e6 {
            return Err(CityPulseError::InvalidBoundingBox(
                "min must be strictly less than max".to_string(),
            ));
        }
        Ok(Self {
            min_lat_e6,
            min_lon_e6,
            max_lat_e6,
            max_lon_e6,
        })
    }

    /// Builds a box from degrees, widening outward to whole micro-degrees.
    pub fn from_degrees(
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Result<Self, CityPulseError> {
        if [min_lat, min_lon, max_lat, max_lon]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(CityPulseError::InvalidBoundingBox(
                "coordinates must be finite".to_string(),
            ));
        }
        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(CityPulseError::InvalidBoundingBox(
                "min must be strictly less than max".to_string(),
            ));
        }
        Self::new(
            to_e6(min_lat, f64::floor),
            to_e6(min_lon, f64::floor),
            to_e6(max_lat, f64::ceil),
            to_e6(max_lon, f64::ceil),
        )
    }

    /// Rejects boxes wider or taller than `max_span` degrees.
    pub fn with_max_span_degrees(self, max_span: f64) -> Result<Self, CityPulseError> {
        let lat_span = e6_to_degrees(self.max_lat_e6 - self.min_lat_e6);
        let lon_span = e6_to_degrees(self.max_lon_e6 - self.min_lon_e6);
        if lat_span > max_span || lon_span > max_span {
            return Err(CityPulseError::InvalidBoundingBox(format!(
                "span {:.6}x{:.6} exceeds {} degrees",
                lat_span, lon_span, max_span
            )));
        }
        Ok(self)
    }

    /// Area in square degrees.
    pub fn area_degrees(&self) -> f64 {
        e6_to_degrees(self.max_lat_e6 - self.min_lat_e6)
            * e6_to_degrees(self.max_lon_e6 - self.min_lon_e6)
    }

    /// Rejects boxes covering more than `max_area` square degrees.
    pub fn with_max_area_degrees(self, max_area: f64) -> Result<Self, CityPulseError> {
        let area = self.area_degrees();
        if area > max_area {
            return Err(CityPulseError::InvalidBoundingBox(format!(
                "area {:.6} exceeds {} square degrees",
                area, max_area
            )));
        }
        Ok(self)
    }

    /// Applies the listing API's default area limit.
    pub fn with_default_area_limit(self) -> Result<Self, CityPulseError> {
        self.with_max_area_degrees(MAX_BBOX_AREA_DEGREES)
    }

    pub fn contains(&self, lat_e6: i64, lon_e6: i64) -> bool {
        (self.min_lat_e6..=self.max_lat_e6).contains(&lat_e6)
            && (self.min_lon_e6..=self.max_lon_e6).contains(&lon_e6)
    }

    /// The box in degrees, x = lon and y = lat.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: e6_to_degrees(self.min_lon_e6),
                y: e6_to_degrees(self.min_lat_e6),
            },
            Coord {
                x: e6_to_degrees(self.max_lon_e6),
                y: e6_to_degrees(self.max_lat_e6),
            },
        )
    }
}

/// Parses `"minLat,minLon,maxLat,maxLon"` in degrees.
impl FromStr for BoundingBox {
    type Err = CityPulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| {
                CityPulseError::InvalidBoundingBox(format!(
                    "expected minLat,minLon,maxLat,maxLon, got '{}'",
                    s
                ))
            })?;

        match parts.as_slice() {
            [min_lat, min_lon, max_lat, max_lon] => {
                Self::from_degrees(*min_lat, *min_lon, *max_lat, *max_lon)
            }
            _ => Err(CityPulseError::InvalidBoundingBox(format!(
                "expected 4 values, got {}",
                parts.len()
            ))),
        }
    }
}

/// Selects which hazards feed a listing or a heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardFilter {
    pub bbox: Option<BoundingBox>,
    pub category: Option<u8>,
    pub include_closed: bool,
    /// Only hazards active within this many hours; `0` disables the window.
    pub time_window_hours: f64,
    pub min_risk: u8,
    pub max_risk: u8,
}

impl Default for HazardFilter {
    fn default() -> Self {
        Self {
            bbox: None,
            category: None,
            include_closed: true,
            time_window_hours: 0.0,
            min_risk: 0,
            max_risk: MAX_RISK_SCORE,
        }
    }
}

impl HazardFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Category `0` means every category.
    pub fn category(mut self, category: u8) -> Self {
        self.category = (category != 0).then_some(category);
        self
    }

    pub fn include_closed(mut self, include: bool) -> Self {
        self.include_closed = include;
        self
    }

    pub fn time_window_hours(mut self, hours: f64) -> Self {
        self.time_window_hours = hours;
        self
    }

    pub fn risk_range(mut self, min_risk: u8, max_risk: u8) -> Result<Self, CityPulseError> {
        let max_clamped = max_risk.min(MAX_RISK_SCORE);
        if min_risk > max_clamped {
            return Err(CityPulseError::InvalidRiskRange {
                min: min_risk,
                max: max_risk,
            });
        }
        self.min_risk = min_risk;
        self.max_risk = max_clamped;
        Ok(self)
    }

    pub fn risk_in_range(&self, risk: u8) -> bool {
        (self.min_risk..=self.max_risk).contains(&risk)
    }

    /// Spatial, category, closed-state and time-window checks.
    ///
    /// Risk bounds are left to the caller because they apply to scored
    /// hazards or heatmap cells, not raw snapshots.
    pub fn matches_at(&self, hazard: &HazardSnapshot, now: f64) -> bool {
        if let Some(bbox) = &self.bbox {
            if !bbox.contains(hazard.lat_e6, hazard.lon_e6) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if hazard.category != category {
                return false;
            }
        }
        if !self.include_closed && hazard.closed {
            return false;
        }
        if self.time_window_hours > 0.0 {
            let cutoff = (now - self.time_window_hours * 3600.0).floor();
            match hazard.last_activity() {
                Some(last) if last >= cutoff => {}
                _ => return false,
            }
        }
        true
    }

    pub fn apply_at<'a>(&self, hazards: &'a [HazardSnapshot], now: f64) -> Vec<&'a HazardSnapshot> {
        hazards.iter().filter(|h| self.matches_at(h, now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: f64 = 1_700_000_000.0;

    #[test]
    fn test_parse_bbox() -> Result<(), CityPulseError> {
        let bbox: BoundingBox = "41.0,28.9,41.1,29.1".parse()?;
        assert_eq!(bbox.min_lat_e6, 41_000_000);
        assert_eq!(bbox.min_lon_e6, 28_900_000);
        assert_eq!(bbox.max_lat_e6, 41_100_000);
        assert_eq!(bbox.max_lon_e6, 29_100_000);
        Ok(())
    }

    #[test]
    fn test_parse_bbox_rejects_bad_input() {
        assert!("1,2,3".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
        assert!("41.1,28.9,41.0,29.1".parse::<BoundingBox>().is_err());
        assert!("41.0,29.0,41.1,29.0".parse::<BoundingBox>().is_err());
        assert!("NaN,28.9,41.1,29.1".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn test_max_span() -> Result<(), CityPulseError> {
        let small: BoundingBox = "41.0,28.0,42.0,29.5".parse()?;
        assert!(small.with_max_span_degrees(2.0).is_ok());

        let large: BoundingBox = "40.0,28.0,43.0,29.0".parse()?;
        assert!(matches!(
            large.with_max_span_degrees(2.0),
            Err(CityPulseError::InvalidBoundingBox(_))
        ));
        Ok(())
    }

    #[test]
    fn test_max_area() -> Result<(), CityPulseError> {
        // 1.0 x 0.4 = 0.4 square degrees
        let narrow: BoundingBox = "41.0,28.8,42.0,29.2".parse()?;
        assert!((narrow.area_degrees() - 0.4).abs() < 1e-9);
        assert!(narrow.with_default_area_limit().is_ok());

        // within the 2 degree span limit but 1.5 x 1.5 = 2.25 square degrees
        let square: BoundingBox = "41.0,28.0,42.5,29.5".parse()?;
        assert!(square.with_max_span_degrees(2.0).is_ok());
        assert!(matches!(
            square.with_default_area_limit(),
            Err(CityPulseError::InvalidBoundingBox(_))
        ));
        Ok(())
    }

    #[test]
    fn test_contains_is_inclusive() -> Result<(), CityPulseError> {
        let bbox = BoundingBox::new(0, 0, 10, 10)?;
        assert!(bbox.contains(0, 0));
        assert!(bbox.contains(10, 10));
        assert!(!bbox.contains(11, 5));
        assert!(!bbox.contains(5, -1));
        Ok(())
    }

    #[test]
    fn test_filter_category_and_closed() {
        let hazards = vec![
            HazardSnapshot::new(0, 0, 3).with_id(1).with_category(2),
            HazardSnapshot::new(0, 0, 3).with_id(2).with_category(4),
            HazardSnapshot::new(0, 0, 3).with_id(3).with_category(2).closed(true),
        ];

        let filter = HazardFilter::new().category(2).include_closed(false);
        let ids: Vec<u64> = filter.apply_at(&hazards, NOW).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1]);

        let all = HazardFilter::new().category(0);
        assert_eq!(all.apply_at(&hazards, NOW).len(), 3);
    }

    #[test]
    fn test_filter_time_window() {
        let hazards = vec![
            HazardSnapshot::new(0, 0, 3).with_id(1).with_last_activity(NOW - 3600.0),
            HazardSnapshot::new(0, 0, 3).with_id(2).with_created_at(NOW - 48.0 * 3600.0),
            HazardSnapshot::new(0, 0, 3).with_id(3),
        ];
        let filter = HazardFilter::new().time_window_hours(24.0);
        let ids: Vec<u64> = filter.apply_at(&hazards, NOW).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_filter_bbox() -> Result<(), CityPulseError> {
        let hazards = vec![
            HazardSnapshot::new(41_050_000, 29_000_000, 3).with_id(1),
            HazardSnapshot::new(40_000_000, 29_000_000, 3).with_id(2),
        ];
        let filter = HazardFilter::new().bbox("41.0,28.9,41.1,29.1".parse()?);
        let ids: Vec<u64> = filter.apply_at(&hazards, NOW).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1]);
        Ok(())
    }

    #[test]
    fn test_risk_range() -> Result<(), CityPulseError> {
        let filter = HazardFilter::new().risk_range(20, 60)?;
        assert!(filter.risk_in_range(20));
        assert!(filter.risk_in_range(60));
        assert!(!filter.risk_in_range(61));

        assert_eq!(
            HazardFilter::new().risk_range(70, 10),
            Err(CityPulseError::InvalidRiskRange { min: 70, max: 10 })
        );
        Ok(())
    }

    #[test]
    fn test_risk_range_above_scale() -> Result<(), CityPulseError> {
        assert_eq!(
            HazardFilter::new().risk_range(150, 200),
            Err(CityPulseError::InvalidRiskRange { min: 150, max: 200 })
        );

        let capped = HazardFilter::new().risk_range(90, 250)?;
        assert_eq!(capped.max_risk, 100);
        assert!(capped.risk_in_range(100));
        Ok(())
    }
}
