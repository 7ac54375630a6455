//! Shared helpers for search modules.

use chrono::{DateTime, TimeDelta, Utc};

use crate::ephemeris::{Body, EphemerisPort};
use crate::error::SearchError;
use crate::root_finder::normalize_to_pm180;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Fractional seconds as a `TimeDelta`, rounded to the microsecond.
pub(crate) fn seconds_to_delta(
    seconds: f64,
    what: &'static str,
) -> Result<TimeDelta, SearchError> {
    let micros = (seconds * MICROS_PER_SECOND).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(SearchError::InvalidConfig(what));
    }
    Ok(TimeDelta::microseconds(micros as i64))
}

pub(crate) fn minutes_to_delta(minutes: f64, what: &'static str) -> Result<TimeDelta, SearchError> {
    seconds_to_delta(minutes * 60.0, what)
}

pub(crate) fn hours_to_delta(hours: f64, what: &'static str) -> Result<TimeDelta, SearchError> {
    seconds_to_delta(hours * 3600.0, what)
}

pub(crate) fn days_to_delta(days: f64, what: &'static str) -> Result<TimeDelta, SearchError> {
    seconds_to_delta(days * 86_400.0, what)
}

/// Signed offset of `body` from `target_deg`, normalized to (-180, 180].
pub(crate) fn offset_from<E: EphemerisPort + ?Sized>(
    eph: &E,
    body: Body,
    target_deg: f64,
    instant: DateTime<Utc>,
) -> Result<f64, SearchError> {
    let lon = eph.longitude_of(body, instant)?.longitude_deg;
    Ok(normalize_to_pm180(lon - target_deg))
}

/// `(center - half, center + half)`, failing at chrono's range limits.
pub(crate) fn window_around(
    center: DateTime<Utc>,
    half: TimeDelta,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SearchError> {
    let start = center.checked_sub_signed(half);
    let end = center.checked_add_signed(half);
    match (start, end) {
        (Some(s), Some(e)) => Ok((s, e)),
        _ => Err(SearchError::InvalidConfig("search window out of representable range")),
    }
}

pub(crate) fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
