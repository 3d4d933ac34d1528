use crate::api::hazard::HazardSnapshot;
use crate::api::heatmap::Heatmap;
use crate::core::risk::Vote;
use crate::util::error::CityPulseError;
use geo_types::Polygon;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Output format for cell polygon geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    /// Well-Known Text format (e.g., "POLYGON((...))")
    Wkt,
    /// GeoJSON format
    GeoJson,
}

/// Configuration for heatmap CSV export.
#[derive(Debug, Clone, Default)]
pub struct HeatmapCsvConfig {
    pub include_geometry: Option<GeometryFormat>,
    /// Cells outside this average-risk range are skipped.
    pub risk_range: Option<(u8, u8)>,
}

impl HeatmapCsvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the cell polygon in a `geometry` column.
    pub fn with_geometry(mut self, format: GeometryFormat) -> Self {
        self.include_geometry = Some(format);
        self
    }

    pub fn risk_range(mut self, min: u8, max: u8) -> Result<Self, CityPulseError> {
        if min > max {
            return Err(CityPulseError::InvalidRiskRange { min, max });
        }
        self.risk_range = Some((min, max));
        Ok(self)
    }
}

fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    use wkt::ToWkt;
    polygon.wkt_string()
}

fn polygon_to_geojson(polygon: &Polygon<f64>) -> String {
    geojson::Geometry::from(polygon).to_string()
}

impl Heatmap {
    /// Writes one row per cell: `key, lat, lon, avg_risk, count[, geometry]`.
    pub fn to_csv(
        &self,
        output_path: impl AsRef<Path>,
        config: &HeatmapCsvConfig,
    ) -> Result<(), CityPulseError> {
        let out_file =
            File::create(output_path).map_err(|e| CityPulseError::IoError(e.to_string()))?;
        let mut writer = csv::Writer::from_writer(out_file);

        let mut header_row = vec!["key", "lat", "lon", "avg_risk", "count"];
        if config.include_geometry.is_some() {
            header_row.push("geometry");
        }
        writer
            .write_record(&header_row)
            .map_err(|e| CityPulseError::CsvError(e.to_string()))?;

        let cells = match config.risk_range {
            Some((min, max)) => self.filter_risk(min, max),
            None => self.cells(),
        };

        for cell in &cells {
            let mut row = vec![
                cell.key.to_string(),
                cell.lat.to_string(),
                cell.lon.to_string(),
                cell.risk.to_string(),
                cell.count.to_string(),
            ];

            if let Some(format) = config.include_geometry {
                let polygon = cell.key.to_rect(self.grid_size_e6()).to_polygon();
                row.push(match format {
                    GeometryFormat::Wkt => polygon_to_wkt(&polygon),
                    GeometryFormat::GeoJson => polygon_to_geojson(&polygon),
                });
            }

            writer
                .write_record(&row)
                .map_err(|e| CityPulseError::CsvError(e.to_string()))?;
        }

        writer
            .flush()
            .map_err(|e| CityPulseError::IoError(e.to_string()))?;

        debug!(rows = cells.len(), "wrote heatmap csv");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct HazardRow {
    id: u64,
    lat_e6: i64,
    lon_e6: i64,
    severity: i32,
    #[serde(default)]
    category: Option<u8>,
    #[serde(default)]
    closed: Option<bool>,
    #[serde(default)]
    created_at: Option<f64>,
    #[serde(default)]
    last_activity_timestamp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VoteRow {
    hazard_id: u64,
    value: i8,
    created_at: f64,
    #[serde(default)]
    trust: Option<f64>,
}

/// Loads hazards and their votes from two CSV exports.
///
/// The hazards file needs `id, lat_e6, lon_e6, severity` and may carry
/// `category, closed, created_at, last_activity_timestamp`. The votes file
/// needs `hazard_id, value, created_at` and may carry `trust`. Votes for
/// unknown hazards are dropped.
///
/// # Example
///
/// ```no_run
/// use citypulse_rs::{aggregate_heatmap, read_hazards_csv};
///
/// let hazards = read_hazards_csv("hazards.csv", "votes.csv").unwrap();
/// let heatmap = aggregate_heatmap(&hazards);
/// ```
pub fn read_hazards_csv(
    hazards_path: impl AsRef<Path>,
    votes_path: impl AsRef<Path>,
) -> Result<Vec<HazardSnapshot>, CityPulseError> {
    let file = File::open(hazards_path).map_err(|e| CityPulseError::IoError(e.to_string()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut hazards = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();
    for result in reader.deserialize() {
        let row: HazardRow = result.map_err(|e| CityPulseError::CsvError(e.to_string()))?;
        let mut hazard = HazardSnapshot::new(row.lat_e6, row.lon_e6, row.severity)
            .with_id(row.id)
            .with_category(row.category.unwrap_or(0))
            .closed(row.closed.unwrap_or(false));
        hazard.created_at = row.created_at;
        hazard.last_activity_timestamp = row.last_activity_timestamp;

        index.insert(row.id, hazards.len());
        hazards.push(hazard);
    }

    let file = File::open(votes_path).map_err(|e| CityPulseError::IoError(e.to_string()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut orphaned = 0usize;
    for result in reader.deserialize() {
        let row: VoteRow = result.map_err(|e| CityPulseError::CsvError(e.to_string()))?;
        let mut vote = Vote::new(row.value, row.created_at);
        if let Some(trust) = row.trust {
            vote = vote.with_trust(trust);
        }
        match index.get(&row.hazard_id) {
            Some(&i) => hazards[i].votes.push(vote),
            None => orphaned += 1,
        }
    }

    debug!(hazards = hazards.len(), orphaned, "loaded hazards from csv");
    Ok(hazards)
}
