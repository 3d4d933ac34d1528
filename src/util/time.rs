use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds, with sub-second precision.
///
/// Every time-relative operation in this crate also has an `_at(now)`
/// variant; this is only the default clock for the plain variants.
pub fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
