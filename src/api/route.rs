use crate::core::astar::{GridPoint, PathCell, Route, RouteOptions, search};
use crate::util::error::CityPulseError;
use tracing::debug;

/// Risk-aware A* route planner over a rectangular cost grid.
///
/// Rows are indexed by `y` and columns by `x`. A missing route is never an
/// error: malformed grids, out-of-bounds endpoints and blocked regions all
/// produce no route.
///
/// # Example
///
/// ```
/// use citypulse_rs::{GridPoint, PathCell, PathPlanner, RouteOptions};
///
/// # fn main() -> Result<(), citypulse_rs::CityPulseError> {
/// let grid = vec![vec![PathCell::default(); 3]; 2];
/// let planner = PathPlanner::new(RouteOptions::default())?;
///
/// let path = planner.route(&grid, GridPoint::new(0, 0), GridPoint::new(2, 0));
/// assert_eq!(path, vec![GridPoint::new(0, 0), GridPoint::new(1, 0), GridPoint::new(2, 0)]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathPlanner {
    options: RouteOptions,
}

impl PathPlanner {
    pub fn new(options: RouteOptions) -> Result<Self, CityPulseError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    /// Finds the cheapest route, with its cost, or `None`.
    pub fn plan(&self, grid: &[Vec<PathCell>], start: GridPoint, end: GridPoint) -> Option<Route> {
        let cols = grid_width(grid)?;
        let rows = grid.len();
        if !in_bounds(start, rows, cols) || !in_bounds(end, rows, cols) {
            debug!(?start, ?end, rows, cols, "endpoint outside grid");
            return None;
        }
        search(grid, cols, start, end, &self.options)
    }

    /// Route points from `start` to `end` inclusive, or an empty vector.
    pub fn route(&self, grid: &[Vec<PathCell>], start: GridPoint, end: GridPoint) -> Vec<GridPoint> {
        self.plan(grid, start, end)
            .map(|route| route.points)
            .unwrap_or_default()
    }
}

/// Column count of a non-empty rectangular grid.
fn grid_width(grid: &[Vec<PathCell>]) -> Option<usize> {
    let cols = grid.first()?.len();
    if cols == 0 {
        debug!("empty routing grid");
        return None;
    }
    if grid.iter().any(|row| row.len() != cols) {
        debug!(rows = grid.len(), "ragged routing grid");
        return None;
    }
    Some(cols)
}

fn in_bounds(p: GridPoint, rows: usize, cols: usize) -> bool {
    p.x >= 0 && p.y >= 0 && (p.x as u64) < cols as u64 && (p.y as u64) < rows as u64
}

/// One-shot route search.
///
/// Options that fail validation (a NaN threshold or a bad penalty) find no route.
pub fn astar_path(
    grid: &[Vec<PathCell>],
    start: GridPoint,
    end: GridPoint,
    options: &RouteOptions,
) -> Vec<GridPoint> {
    match PathPlanner::new(*options) {
        Ok(planner) => planner.route(grid, start, end),
        Err(e) => {
            debug!(error = %e, "rejected route options");
            Vec::new()
        }
    }
}
