use crate::api::hazard::HazardSnapshot;
use crate::core::constants::DEFAULT_GRID_SIZE_E6;
use crate::core::grid::{CellKey, validate_grid_size};
use crate::core::risk::RiskScorer;
use crate::util::coord::e6_to_degrees;
use crate::util::error::CityPulseError;
use crate::util::time::now_unix;
use geo::BoundingRect;
use geo_types::{MultiPolygon, Polygon, Rect};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Running totals for one cell. Integer sums keep the reduction associative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CellAccumulator {
    total_risk: u64,
    count: u64,
}

impl CellAccumulator {
    fn add(&mut self, risk: u8) {
        self.total_risk += u64::from(risk);
        self.count += 1;
    }

    fn merge(&mut self, other: CellAccumulator) {
        self.total_risk += other.total_risk;
        self.count += other.count;
    }

    /// `round(total / count)`, computed without floats.
    fn reduce(&self) -> CellStats {
        let avg = (self.total_risk * 2 + self.count) / (self.count * 2);
        CellStats {
            avg_risk: avg as u8,
            count: self.count,
        }
    }
}

type Accumulators = BTreeMap<CellKey, CellAccumulator>;

fn merge_accumulators(mut left: Accumulators, right: Accumulators) -> Accumulators {
    for (key, acc) in right {
        left.entry(key).or_default().merge(acc);
    }
    left
}

/// Average risk and hazard count of one heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStats {
    pub avg_risk: u8,
    pub count: u64,
}

/// Buckets hazards into a square grid and averages their risk per cell.
///
/// # Example
///
/// ```
/// use citypulse_rs::{HazardSnapshot, HeatmapAggregator, Vote};
///
/// # fn main() -> Result<(), citypulse_rs::CityPulseError> {
/// let now = 1_700_000_000.0;
/// let hazards = vec![
///     HazardSnapshot::new(41_015_137, 28_979_530, 3).with_votes(vec![Vote::up(now)]),
///     HazardSnapshot::new(41_015_200, 28_979_600, 5).with_votes(vec![Vote::up(now)]),
/// ];
///
/// let heatmap = HeatmapAggregator::builder().grid_size_e6(900).build()?.aggregate_at(&hazards, now);
/// let cell = heatmap.get_key("45572_32199").unwrap();
/// assert_eq!(cell.count, 2);
/// assert_eq!(cell.avg_risk, 16);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapAggregator {
    grid_size_e6: i64,
    scorer: RiskScorer,
}

impl Default for HeatmapAggregator {
    fn default() -> Self {
        Self {
            grid_size_e6: DEFAULT_GRID_SIZE_E6,
            scorer: RiskScorer::default(),
        }
    }
}

impl HeatmapAggregator {
    pub fn builder() -> HeatmapAggregatorBuilder {
        HeatmapAggregatorBuilder::new()
    }

    pub fn grid_size_e6(&self) -> i64 {
        self.grid_size_e6
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Aggregates against the wall clock.
    pub fn aggregate(&self, hazards: &[HazardSnapshot]) -> Heatmap {
        self.aggregate_at(hazards, now_unix())
    }

    /// Aggregates as seen at unix time `now`.
    pub fn aggregate_at(&self, hazards: &[HazardSnapshot], now: f64) -> Heatmap {
        let mut acc = Accumulators::new();
        for hazard in hazards {
            let key = CellKey::containing(hazard.lat_e6, hazard.lon_e6, self.grid_size_e6);
            acc.entry(key)
                .or_default()
                .add(hazard.risk_at(&self.scorer, now));
        }
        self.finish(acc, hazards.len())
    }

    /// Parallel variant of [`HeatmapAggregator::aggregate_at`].
    ///
    /// Produces exactly the same heatmap regardless of thread count.
    pub fn aggregate_par_at(&self, hazards: &[HazardSnapshot], now: f64) -> Heatmap {
        let acc = hazards
            .par_iter()
            .fold(Accumulators::new, |mut acc, hazard| {
                let key = CellKey::containing(hazard.lat_e6, hazard.lon_e6, self.grid_size_e6);
                acc.entry(key)
                    .or_default()
                    .add(hazard.risk_at(&self.scorer, now));
                acc
            })
            .reduce(Accumulators::new, merge_accumulators);
        self.finish(acc, hazards.len())
    }

    fn finish(&self, acc: Accumulators, hazard_count: usize) -> Heatmap {
        let cells: BTreeMap<CellKey, CellStats> =
            acc.into_iter().map(|(key, a)| (key, a.reduce())).collect();
        debug!(
            hazards = hazard_count,
            cells = cells.len(),
            grid_size_e6 = self.grid_size_e6,
            "aggregated heatmap"
        );
        Heatmap {
            grid_size_e6: self.grid_size_e6,
            cells,
        }
    }
}

#[derive(Debug, Default)]
pub struct HeatmapAggregatorBuilder {
    grid_size_e6: Option<i64>,
    scorer: Option<RiskScorer>,
}

impl HeatmapAggregatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid_size_e6(mut self, grid_size_e6: i64) -> Self {
        self.grid_size_e6 = Some(grid_size_e6);
        self
    }

    pub fn scorer(mut self, scorer: RiskScorer) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn build(self) -> Result<HeatmapAggregator, CityPulseError> {
        let grid_size_e6 = self.grid_size_e6.unwrap_or(DEFAULT_GRID_SIZE_E6);
        validate_grid_size(grid_size_e6)?;
        Ok(HeatmapAggregator {
            grid_size_e6,
            scorer: self.scorer.unwrap_or_default(),
        })
    }
}

/// Aggregates with the default 900 E6 grid against the wall clock.
pub fn aggregate_heatmap(hazards: &[HazardSnapshot]) -> Heatmap {
    HeatmapAggregator::default().aggregate(hazards)
}

/// Aggregates with the default 900 E6 grid as seen at `now`.
pub fn aggregate_heatmap_at(hazards: &[HazardSnapshot], now: f64) -> Heatmap {
    HeatmapAggregator::default().aggregate_at(hazards, now)
}

/// One cell placed back in geographic space, for map rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub key: CellKey,
    /// South-west corner latitude in degrees.
    pub lat: f64,
    /// South-west corner longitude in degrees.
    pub lon: f64,
    pub risk: u8,
    pub count: u64,
}

/// Aggregated risk per grid cell. Cells without hazards are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    grid_size_e6: i64,
    cells: BTreeMap<CellKey, CellStats>,
}

impl Heatmap {
    pub fn grid_size_e6(&self) -> i64 {
        self.grid_size_e6
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, key: &CellKey) -> Option<&CellStats> {
        self.cells.get(key)
    }

    /// Looks a cell up by its `"<lat>_<lon>"` key; malformed keys find nothing.
    pub fn get_key(&self, key: &str) -> Option<&CellStats> {
        key.parse::<CellKey>().ok().and_then(|k| self.cells.get(&k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &CellStats)> {
        self.cells.iter()
    }

    /// The `{"<lat>_<lon>": {avgRisk, count}}` map handed to the map client.
    pub fn to_key_map(&self) -> BTreeMap<String, CellStats> {
        self.cells
            .iter()
            .map(|(key, stats)| (key.to_string(), *stats))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, CityPulseError> {
        serde_json::to_string(&self.to_key_map())
            .map_err(|e| CityPulseError::JsonError(e.to_string()))
    }

    pub fn cells(&self) -> Vec<HeatmapCell> {
        self.cells
            .iter()
            .map(|(key, stats)| {
                let (lat_e6, lon_e6) = key.origin_e6(self.grid_size_e6);
                HeatmapCell {
                    key: *key,
                    lat: e6_to_degrees(lat_e6),
                    lon: e6_to_degrees(lon_e6),
                    risk: stats.avg_risk,
                    count: stats.count,
                }
            })
            .collect()
    }

    /// Cells whose average risk lies in `min..=max`.
    pub fn filter_risk(&self, min: u8, max: u8) -> Vec<HeatmapCell> {
        self.cells()
            .into_iter()
            .filter(|cell| (min..=max).contains(&cell.risk))
            .collect()
    }

    pub fn to_polygons(&self) -> Vec<Polygon<f64>> {
        self.cells
            .keys()
            .map(|key| key.to_rect(self.grid_size_e6).to_polygon())
            .collect()
    }

    /// Extent of all cells in degrees, or `None` for an empty heatmap.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        MultiPolygon::new(self.to_polygons()).bounding_rect()
    }
}
