use crate::core::constants::{
    BASE_STEP_COST, DEFAULT_RISK_THRESHOLD, LEGACY_OVER_THRESHOLD_PENALTY, MIN_STEP_COST,
    RAMP_DISCOUNT, RISK_COST_DIVISOR, STAIRS_PENALTY,
};
use crate::util::error::CityPulseError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// Routing attributes of one grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathCell {
    pub risk: f64,
    pub has_ramp: bool,
    pub has_stairs: bool,
}

impl PathCell {
    pub fn new(risk: f64) -> Self {
        Self {
            risk,
            ..Self::default()
        }
    }

    pub fn with_ramp(mut self) -> Self {
        self.has_ramp = true;
        self
    }

    pub fn with_stairs(mut self) -> Self {
        self.has_stairs = true;
        self
    }
}

/// Routing grid indices: `x` is the column, `y` the row.
///
/// Signed so that out-of-range input can be represented and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &GridPoint) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// What happens to a cell whose risk is above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "penalty", rename_all = "camelCase")]
pub enum OverThreshold {
    /// The cell is excluded from the search.
    #[default]
    Impassable,
    /// The cell stays passable with a fixed surcharge on its cost.
    Penalty(f64),
}

impl OverThreshold {
    /// The soft mode older deployments used: `+100` per risky cell.
    pub fn legacy() -> Self {
        OverThreshold::Penalty(LEGACY_OVER_THRESHOLD_PENALTY)
    }
}

/// Options for a single route search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteOptions {
    pub risk_threshold: f64,
    pub wheelchair_mode: bool,
    pub over_threshold: OverThreshold,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            wheelchair_mode: false,
            over_threshold: OverThreshold::Impassable,
        }
    }
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn risk_threshold(mut self, threshold: f64) -> Self {
        self.risk_threshold = threshold;
        self
    }

    pub fn wheelchair_mode(mut self, enabled: bool) -> Self {
        self.wheelchair_mode = enabled;
        self
    }

    pub fn over_threshold(mut self, mode: OverThreshold) -> Self {
        self.over_threshold = mode;
        self
    }

    pub fn validate(&self) -> Result<(), CityPulseError> {
        if self.risk_threshold.is_nan() {
            return Err(CityPulseError::InvalidRiskThreshold(
                "threshold is NaN".to_string(),
            ));
        }
        if let OverThreshold::Penalty(p) = self.over_threshold {
            if !(p.is_finite() && p >= 0.0) {
                return Err(CityPulseError::InvalidRiskThreshold(format!(
                    "over-threshold penalty must be finite and non-negative, got {}",
                    p
                )));
            }
        }
        Ok(())
    }

    /// Cost of stepping into `cell`, or `None` when the cell cannot be entered.
    pub fn cell_cost(&self, cell: &PathCell) -> Option<f64> {
        if !cell.risk.is_finite() {
            return None;
        }

        let mut cost = BASE_STEP_COST + cell.risk / RISK_COST_DIVISOR;

        if cell.risk > self.risk_threshold || self.risk_threshold.is_nan() {
            match self.over_threshold {
                OverThreshold::Impassable => return None,
                OverThreshold::Penalty(p) if p.is_finite() => cost += p,
                OverThreshold::Penalty(_) => return None,
            }
        }

        if self.wheelchair_mode {
            if cell.has_ramp {
                cost -= RAMP_DISCOUNT;
            }
            if cell.has_stairs {
                cost += STAIRS_PENALTY;
            }
        }

        Some(cost.max(MIN_STEP_COST))
    }
}

/// A found route: grid points from start to end inclusive, and the summed
/// cost of every cell entered after the start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub points: Vec<GridPoint>,
    pub total_cost: f64,
}

impl Route {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One arena slot. `parent` indexes back into the same arena.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    cell: usize,
    g: f64,
    parent: Option<usize>,
}

/// Min-heap entry: lowest `f` first, insertion order breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: OrderedFloat<f64>,
    seq: u64,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const DIRECTIONS: [(i64, i64); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Risk-aware A* over a rectangular grid of `rows` rows.
///
/// The caller has already checked that the grid is non-empty and rectangular
/// and that both endpoints are in bounds.
pub(crate) fn search(
    grid: &[Vec<PathCell>],
    cols: usize,
    start: GridPoint,
    end: GridPoint,
    options: &RouteOptions,
) -> Option<Route> {
    let rows = grid.len();
    let index = |p: GridPoint| p.y as usize * cols + p.x as usize;
    let point = |i: usize| GridPoint::new((i % cols) as i64, (i / cols) as i64);

    if start == end {
        return Some(Route {
            points: vec![start],
            total_cost: 0.0,
        });
    }

    let costs: Vec<Option<f64>> = grid
        .iter()
        .flat_map(|row| row.iter().map(|cell| options.cell_cost(cell)))
        .collect();

    // Every step costs at least the cheapest passable cell, which keeps the
    // scaled Manhattan heuristic admissible and consistent.
    let h_scale = costs
        .iter()
        .flatten()
        .fold(f64::INFINITY, |acc, &c| acc.min(c));
    if !h_scale.is_finite() {
        debug!(rows, cols, "no passable cells");
        return None;
    }
    let heuristic = |p: GridPoint| p.manhattan(&end) as f64 * h_scale;

    let start_idx = index(start);
    let end_idx = index(end);

    let mut g_score = vec![f64::INFINITY; rows * cols];
    let mut visited = vec![false; rows * cols];
    let mut nodes: Vec<SearchNode> = Vec::new();
    let mut open = BinaryHeap::new();
    let mut seq: u64 = 0;

    g_score[start_idx] = 0.0;
    nodes.push(SearchNode {
        cell: start_idx,
        g: 0.0,
        parent: None,
    });
    open.push(OpenEntry {
        f: OrderedFloat(heuristic(start)),
        seq,
        node: 0,
    });

    let mut expanded = 0usize;

    while let Some(entry) = open.pop() {
        let current = nodes[entry.node];
        if visited[current.cell] || current.g > g_score[current.cell] {
            continue;
        }

        if current.cell == end_idx {
            let route = reconstruct(&nodes, entry.node, point, current.g);
            debug!(
                expanded,
                steps = route.points.len(),
                cost = route.total_cost,
                "route found"
            );
            return Some(route);
        }

        visited[current.cell] = true;
        expanded += 1;

        let here = point(current.cell);
        for (dx, dy) in DIRECTIONS {
            let next = GridPoint::new(here.x + dx, here.y + dy);
            if next.x < 0 || next.y < 0 || next.x as usize >= cols || next.y as usize >= rows {
                continue;
            }
            let next_idx = index(next);
            if visited[next_idx] {
                continue;
            }
            let Some(step) = costs[next_idx] else {
                continue;
            };

            let candidate = current.g + step;
            if candidate >= g_score[next_idx] {
                continue;
            }
            g_score[next_idx] = candidate;

            nodes.push(SearchNode {
                cell: next_idx,
                g: candidate,
                parent: Some(entry.node),
            });
            seq += 1;
            open.push(OpenEntry {
                f: OrderedFloat(candidate + heuristic(next)),
                seq,
                node: nodes.len() - 1,
            });
            trace!(x = next.x, y = next.y, g = candidate, "relaxed");
        }
    }

    debug!(expanded, "open set exhausted without reaching the goal");
    None
}

fn reconstruct(
    nodes: &[SearchNode],
    goal: usize,
    point: impl Fn(usize) -> GridPoint,
    total_cost: f64,
) -> Route {
    let mut points = Vec::new();
    let mut cursor = Some(goal);
    while let Some(i) = cursor {
        points.push(point(nodes[i].cell));
        cursor = nodes[i].parent;
    }
    points.reverse();
    Route { points, total_cost }
}
