//! # citypulse-rs
//!
//! Risk scoring, spatial heatmaps and risk-aware routing for crowd-reported
//! urban hazards. There are three main entry points.
//!
//! ### 1. `RiskScorer` - Per-Hazard Risk
//!
//! ```
//! use citypulse_rs::{RiskScorer, Vote};
//!
//! let now = 1_700_000_000.0;
//! let votes = vec![Vote::up(now), Vote::up(now - 3600.0), Vote::down(now)];
//! let risk = RiskScorer::default().score_at(4.0, &votes, Some(now), now);
//! assert!(risk <= 100);
//! ```
//!
//! ### 2. `HeatmapAggregator` - Grid Roll-Up
//!
//! ```
//! use citypulse_rs::{HazardSnapshot, HeatmapAggregator, Vote};
//!
//! # fn main() -> Result<(), citypulse_rs::CityPulseError> {
//! let now = 1_700_000_000.0;
//! let hazards = vec![
//!     HazardSnapshot::new(41_015_137, 28_979_530, 3).with_votes(vec![Vote::up(now)]),
//! ];
//!
//! let heatmap = HeatmapAggregator::builder()
//!     .grid_size_e6(900)
//!     .build()?
//!     .aggregate_at(&hazards, now);
//!
//! println!("{}", heatmap.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. `PathPlanner` - Risk-Aware Routing
//!
//! ```
//! use citypulse_rs::{GridPoint, PathCell, RouteOptions, astar_path};
//!
//! let mut grid = vec![vec![PathCell::default(); 3]; 3];
//! grid[0][1] = PathCell::new(80.0);
//!
//! let path = astar_path(&grid, GridPoint::new(0, 0), GridPoint::new(2, 0), &RouteOptions::default());
//! assert_eq!(path.len(), 5);
//! ```
//!
//! Heatmaps can be exported as GeoJSON, CSV, Arrow or GeoParquet:
//!
//! ```no_run
//! use citypulse_rs::{
//!     GeometryFormat, HeatmapCsvConfig, HeatmapToGeoParquet, aggregate_heatmap, read_hazards_csv,
//! };
//!
//! # fn main() -> Result<(), citypulse_rs::CityPulseError> {
//! let hazards = read_hazards_csv("hazards.csv", "votes.csv")?;
//! let heatmap = aggregate_heatmap(&hazards);
//!
//! heatmap.to_csv("heatmap.csv", &HeatmapCsvConfig::new().with_geometry(GeometryFormat::Wkt))?;
//! heatmap.to_geoparquet("heatmap.parquet")?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod core;
pub mod util;

pub use api::{
    BoundingBox, CellStats, GeometryFormat, HazardFilter, HazardSnapshot, HazardSort, HazardStats,
    HazardSummary, Heatmap, HeatmapAggregator, HeatmapAggregatorBuilder, HeatmapCell,
    HeatmapCsvConfig, HeatmapToArrow, HeatmapToGeoParquet, PathPlanner, VoteTally,
    aggregate_heatmap, aggregate_heatmap_at, astar_path, read_hazards_csv, read_heatmap_metadata,
    write_geoparquet, write_geoparquet_with_metadata,
};
pub use core::{
    CellKey, DEFAULT_GRID_SIZE_E6, DEFAULT_RISK_THRESHOLD, E6_SCALE, GridPoint, MAX_RISK_SCORE,
    OverThreshold, PathCell, RiskScorer, RiskScorerBuilder, Route, RouteOptions, Vote,
    calculate_risk_score, calculate_risk_score_at, create_cell_polygon, create_cell_rect,
    point_to_bucket,
};
pub use util::{
    CityPulseError, Coordinate, FixedGeoCoordinate, decode_cell_key, degrees_to_e6,
    e6_to_degrees, generate_cell_key, now_unix,
};

pub use geo_types;
pub use geoarrow_array;
pub use geoarrow_schema;
