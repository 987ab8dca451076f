//! Unit Conversion Functions
//!
//! Conversions between timeline ticks and physical units:
//! - Time: nanoseconds ↔ seconds
//! - Rate: Hz ↔ sample period

/// Nanoseconds per second
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Convert nanosecond ticks to seconds
pub fn nanos_to_seconds(nanos: i64) -> f64 {
    nanos as f64 / NANOS_PER_SECOND
}

/// Convert seconds to nanosecond ticks, rounded to the nearest tick
pub fn seconds_to_nanos(seconds: f64) -> i64 {
    (seconds * NANOS_PER_SECOND).round() as i64
}

/// Sample period in nanoseconds for a rate in Hz
///
/// # Returns
/// `None` for non-positive or non-finite rates
pub fn hz_to_period_nanos(hz: f64) -> Option<i64> {
    if hz.is_finite() && hz > 0.0 {
        Some((NANOS_PER_SECOND / hz).round() as i64)
    } else {
        None
    }
}

/// Rate in Hz for a sample period in seconds
pub fn period_to_hz(period_seconds: f64) -> f64 {
    1.0 / period_seconds
}
