/// Scale factor between degrees and E6 integer units.
pub const E6_SCALE: i64 = 1_000_000;

/// Default heatmap cell edge in E6 units (~100m at mid-latitudes).
pub const DEFAULT_GRID_SIZE_E6: i64 = 900;

/// Separator between the lat and lon bucket in a heatmap cell key.
pub const CELL_KEY_SEPARATOR: char = '_';

/// Half-life of an individual vote's weight: 72 hours.
pub const VOTE_HALF_LIFE_SECS: f64 = 72.0 * 3600.0;

/// Half-life of the hazard-wide freshness multiplier: 7 days.
pub const FRESHNESS_HALF_LIFE_DAYS: f64 = 7.0;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Severity is clamped into this range before scoring.
pub const MIN_SEVERITY: f64 = 1.0;
pub const MAX_SEVERITY: f64 = 5.0;

/// Log-compressed evidence is clamped to `[-MAX_EVIDENCE, MAX_EVIDENCE]`.
pub const MAX_EVIDENCE: f64 = 5.0;

/// `|severity * evidence|` is multiplied by this before rounding to 0..=100.
pub const RISK_SCALE: f64 = 4.0;

pub const MAX_RISK_SCORE: u8 = 100;

/// Hazards at or above this score count as high risk in summaries.
pub const HIGH_RISK_SCORE: u8 = 70;

/// Largest query window the listing API accepts, in square degrees.
pub const MAX_BBOX_AREA_DEGREES: f64 = 0.5;

/// Default routing threshold above which a cell is impassable.
pub const DEFAULT_RISK_THRESHOLD: f64 = 50.0;

/// Base cost of entering any cell.
pub const BASE_STEP_COST: f64 = 1.0;

/// Cell risk is divided by this and added to the base step cost.
pub const RISK_COST_DIVISOR: f64 = 20.0;

/// Wheelchair mode discount for cells with a ramp.
pub const RAMP_DISCOUNT: f64 = 0.5;

/// Wheelchair mode surcharge for cells with stairs.
pub const STAIRS_PENALTY: f64 = 10.0;

/// Every traversable step costs at least this much.
pub const MIN_STEP_COST: f64 = 0.1;

/// Fixed surcharge used by the legacy soft over-threshold mode.
pub const LEGACY_OVER_THRESHOLD_PENALTY: f64 = 100.0;
