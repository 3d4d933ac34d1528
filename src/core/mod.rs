pub mod astar;
pub mod constants;
pub mod geometry;
pub mod grid;
pub mod risk;

pub use astar::{GridPoint, OverThreshold, PathCell, Route, RouteOptions};
pub use constants::{DEFAULT_GRID_SIZE_E6, DEFAULT_RISK_THRESHOLD, E6_SCALE, MAX_RISK_SCORE};
pub use geometry::{create_cell_polygon, create_cell_rect};
pub use grid::{CellKey, bucket_to_point, point_to_bucket, validate_grid_size};
pub use risk::{RiskScorer, RiskScorerBuilder, Vote, calculate_risk_score, calculate_risk_score_at};
