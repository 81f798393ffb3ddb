use crate::models::ProgressRecord;

/// Positions at or below this many seconds are treated as noise, not a
/// deliberate resume point.
pub const NEAR_START_THRESHOLD_SECS: f64 = 10.0;

/// Decide whether and where to seek when a video loads.
///
/// Returns `None` (start from zero) when there is no usable record, the
/// stored position is within the near-start threshold, or the position is at
/// or past the known duration (stale record for a since-changed file).
/// A malformed position (negative, NaN) counts as no resume point.
pub fn decide(record: Option<&ProgressRecord>, duration: Option<f64>) -> Option<f64> {
    let record = record?;
    let position = record.position_secs;

    if !position.is_finite() || position < 0.0 {
        return None;
    }
    if position <= NEAR_START_THRESHOLD_SECS {
        return None;
    }
    if let Some(duration) = duration {
        if duration.is_finite() && position >= duration {
            return None;
        }
    }

    Some(position)
}
