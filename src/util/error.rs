/// Error type for citypulse-rs operations.
///
/// Only misconfiguration and I/O surface here. Expected data-shape edge
/// cases (bad severities, stale votes, unreachable routes) degrade to zero
/// scores or empty results instead.
#[derive(Debug, PartialEq)]
pub enum CityPulseError {
    /// The heatmap grid size must be strictly positive (E6 units).
    InvalidGridSize(i64),
    /// A half-life parameter is non-positive or non-finite.
    InvalidHalfLife(String),
    /// The routing risk threshold is not a finite number.
    InvalidRiskThreshold(String),
    /// The minimum risk of a filter is greater than the maximum.
    InvalidRiskRange { min: u8, max: u8 },
    /// A bounding box could not be parsed or is degenerate.
    InvalidBoundingBox(String),
    /// A `"<lat>_<lon>"` cell key could not be parsed.
    InvalidCellKey(String),
    /// File I/O or Arrow/Parquet serialization error.
    IoError(String),
    /// CSV parsing or writing error.
    CsvError(String),
    /// JSON serialization error.
    JsonError(String),
}

impl std::fmt::Display for CityPulseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CityPulseError::InvalidGridSize(size) => {
                write!(f, "Invalid grid size: {} (must be > 0)", size)
            }
            CityPulseError::InvalidHalfLife(msg) => write!(f, "Invalid half-life: {}", msg),
            CityPulseError::InvalidRiskThreshold(msg) => {
                write!(f, "Invalid risk threshold: {}", msg)
            }
            CityPulseError::InvalidRiskRange { min, max } => {
                write!(f, "Invalid risk range: min {} is greater than max {}", min, max)
            }
            CityPulseError::InvalidBoundingBox(msg) => write!(f, "Invalid bounding box: {}", msg),
            CityPulseError::InvalidCellKey(key) => write!(f, "Invalid cell key: '{}'", key),
            CityPulseError::IoError(msg) => write!(f, "IO error: {}", msg),
            CityPulseError::CsvError(msg) => write!(f, "CSV error: {}", msg),
            CityPulseError::JsonError(msg) => write!(f, "JSON error: {}", msg),
        }
    }
}

impl std::error::Error for CityPulseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CityPulseError::InvalidGridSize(0).to_string(),
            "Invalid grid size: 0 (must be > 0)"
        );
        assert_eq!(
            CityPulseError::InvalidRiskRange { min: 80, max: 20 }.to_string(),
            "Invalid risk range: min 80 is greater than max 20"
        );
        assert_eq!(
            CityPulseError::InvalidCellKey("12-4".to_string()).to_string(),
            "Invalid cell key: '12-4'"
        );
    }
}
