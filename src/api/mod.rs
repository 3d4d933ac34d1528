pub mod filter;
pub mod hazard;
pub mod heatmap;
pub mod heatmap_arrow;
pub mod heatmap_csv;
pub mod heatmap_geojson;
pub mod heatmap_parquet;
pub mod route;

pub use filter::{BoundingBox, HazardFilter};
pub use hazard::{HazardSnapshot, HazardSort, HazardStats, HazardSummary, VoteTally};
pub use heatmap::{
    CellStats, Heatmap, HeatmapAggregator, HeatmapAggregatorBuilder, HeatmapCell,
    aggregate_heatmap, aggregate_heatmap_at,
};
pub use heatmap_arrow::HeatmapToArrow;
pub use heatmap_csv::{GeometryFormat, HeatmapCsvConfig, read_hazards_csv};
pub use heatmap_parquet::{
    HeatmapToGeoParquet, read_heatmap_metadata, write_geoparquet, write_geoparquet_with_metadata,
};
pub use route::{PathPlanner, astar_path};
