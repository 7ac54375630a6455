//! Shared angle and calendar helpers.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, TimeZone, Utc};

use crate::dasha::types::DAYS_PER_YEAR;
use crate::error::DashaError;

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Normalize an angle to [0, 360) degrees.
pub fn normalize_360(deg: f64) -> f64 {
    let r = deg % 360.0;
    if r < 0.0 { r + 360.0 } else { r }
}

/// Convert fractional days to a `TimeDelta` rounded to the microsecond.
pub fn days_to_delta(days: f64) -> Result<TimeDelta, DashaError> {
    let micros = (days * MICROS_PER_DAY).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(DashaError::InvalidInput("duration out of range"));
    }
    Ok(TimeDelta::microseconds(micros as i64))
}

/// Convert classical years (at `DAYS_PER_YEAR`) to a `TimeDelta`.
pub fn years_to_delta(years: f64) -> Result<TimeDelta, DashaError> {
    days_to_delta(years * DAYS_PER_YEAR)
}

/// Length of `delta` in fractional days.
pub fn delta_days(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / MICROS_PER_DAY,
        None => delta.num_milliseconds() as f64 / 86_400_000.0,
    }
}

/// `start + delta`, failing instead of panicking at chrono's range limits.
pub fn checked_shift(start: DateTime<Utc>, delta: TimeDelta) -> Result<DateTime<Utc>, DashaError> {
    start
        .checked_add_signed(delta)
        .ok_or(DashaError::InvalidInput("instant out of representable range"))
}

/// Local civil time at `tz_offset_hours` east of UTC, as a UTC instant.
pub fn local_to_utc(local: NaiveDateTime, tz_offset_hours: f64) -> Result<DateTime<Utc>, DashaError> {
    let secs = (tz_offset_hours * 3600.0).round();
    if !secs.is_finite() || secs.abs() >= 86_400.0 {
        return Err(DashaError::InvalidInput("timezone offset out of range"));
    }
    let offset = FixedOffset::east_opt(secs as i32)
        .ok_or(DashaError::InvalidInput("timezone offset out of range"))?;
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(DashaError::InvalidInput("local time is not representable"))
}
