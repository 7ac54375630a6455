//! Solar return (varshaphal) search: the instant the Sun comes back to its
//! natal sidereal longitude.
//!
//! Two methods:
//! - `Grid`: coarse grid of ±36 h at 2 h, nested refinement grids, then a
//!   short bisection to sub-second precision.
//! - `Bisection`: bisect directly on a ±2 day bracket, widening by 2 days up
//!   to 5 times.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ephemeris::{Body, EphemerisPort};
use crate::error::SearchError;
use crate::root_finder::{AngularRootFinder, GridPass, RootFindProblem, refine_by_grid};
use crate::search_util::{
    days_to_delta, hours_to_delta, minutes_to_delta, offset_from, positive, seconds_to_delta,
    window_around,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarReturnMethod {
    #[default]
    Grid,
    Bisection,
}

/// One nested grid pass, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefinePass {
    pub half_window_minutes: f64,
    pub step_minutes: f64,
}

impl RefinePass {
    pub const fn new(half_window_minutes: f64, step_minutes: f64) -> Self {
        Self {
            half_window_minutes,
            step_minutes,
        }
    }
}

/// Default refinement after the coarse grid: 20, 5 and 1 minute steps.
pub const DEFAULT_REFINE_PASSES: [RefinePass; 3] = [
    RefinePass::new(120.0, 20.0),
    RefinePass::new(40.0, 5.0),
    RefinePass::new(10.0, 1.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarReturnConfig {
    pub method: SolarReturnMethod,
    /// Grid: half width of the coarse grid around the approximate instant.
    pub coarse_half_window_hours: f64,
    pub coarse_step_hours: f64,
    /// Grid: finish with a ±1 minute bisection.
    pub final_bisection: bool,
    /// Bisection: half width of the initial bracket.
    pub bracket_half_window_days: f64,
    /// Bisection: days added to each side per widening.
    pub widen_days: f64,
    pub max_widenings: u32,
    pub max_iterations: u32,
    pub degree_tolerance: f64,
    pub time_tolerance_seconds: f64,
    /// Grid: nested passes after the coarse grid.
    pub refine_passes: Vec<RefinePass>,
}

impl Default for SolarReturnConfig {
    fn default() -> Self {
        Self {
            method: SolarReturnMethod::Grid,
            coarse_half_window_hours: 36.0,
            coarse_step_hours: 2.0,
            final_bisection: true,
            bracket_half_window_days: 2.0,
            widen_days: 2.0,
            max_widenings: 5,
            max_iterations: 80,
            degree_tolerance: 1e-5,
            time_tolerance_seconds: 0.1,
            refine_passes: DEFAULT_REFINE_PASSES.to_vec(),
        }
    }
}

impl SolarReturnConfig {
    pub fn bisection() -> Self {
        Self {
            method: SolarReturnMethod::Bisection,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !positive(self.coarse_half_window_hours) || !positive(self.coarse_step_hours) {
            return Err("coarse grid window and step must be positive");
        }
        if self
            .refine_passes
            .iter()
            .any(|p| {
                !positive(p.step_minutes)
                    || p.half_window_minutes.is_nan()
                    || p.half_window_minutes < 0.0
            })
        {
            return Err("refine passes need a positive step and non-negative window");
        }
        if !positive(self.bracket_half_window_days) {
            return Err("bracket_half_window_days must be positive");
        }
        if self.max_widenings > 0 && !positive(self.widen_days) {
            return Err("widen_days must be positive when widening is enabled");
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        if !self.degree_tolerance.is_finite() || self.degree_tolerance < 0.0 {
            return Err("degree_tolerance must be non-negative");
        }
        if !positive(self.time_tolerance_seconds) {
            return Err("time_tolerance_seconds must be positive");
        }
        Ok(())
    }
}

/// A located solar return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarReturn {
    pub instant: DateTime<Utc>,
    /// Sun's sidereal longitude at `instant`.
    pub sun_longitude: f64,
    /// Signed distance from the natal longitude, in degrees.
    pub residual_deg: f64,
    pub method: SolarReturnMethod,
}

/// Find the instant near `approx` at which the Sun is at `natal_sun_lon`.
pub fn exact_solar_return<E: EphemerisPort + ?Sized>(
    eph: &E,
    natal_sun_lon: f64,
    approx: DateTime<Utc>,
    config: &SolarReturnConfig,
) -> Result<SolarReturn, SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;
    if !natal_sun_lon.is_finite() {
        return Err(SearchError::InvalidConfig("natal Sun longitude must be finite"));
    }
    let f = |t: DateTime<Utc>| offset_from(eph, Body::Sun, natal_sun_lon, t);

    let instant = match config.method {
        SolarReturnMethod::Grid => grid_search(approx, config, f)?,
        SolarReturnMethod::Bisection => bisection_search(approx, config, f)?,
    };

    let sun_longitude = eph.longitude_of(Body::Sun, instant)?.longitude_deg;
    let residual_deg = offset_from(eph, Body::Sun, natal_sun_lon, instant)?;
    debug!(%instant, residual_deg, method = ?config.method, "solar return");
    Ok(SolarReturn {
        instant,
        sun_longitude,
        residual_deg,
        method: config.method,
    })
}

/// Solar return for `year`, starting from the birth date in that year.
///
/// The natal longitude is read from `eph` at `birth`. A 29 February birth
/// falls back to 28 February in common years.
pub fn solar_return_for_year<E: EphemerisPort + ?Sized>(
    eph: &E,
    birth: DateTime<Utc>,
    year: i32,
    config: &SolarReturnConfig,
) -> Result<SolarReturn, SearchError> {
    let natal = eph.longitude_of(Body::Sun, birth)?.longitude_deg;
    let approx = same_date_in_year(birth, year)
        .ok_or(SearchError::InvalidConfig("year out of representable range"))?;
    exact_solar_return(eph, natal, approx, config)
}

/// `birth`'s month, day and time of day placed in `year`.
pub fn same_date_in_year(birth: DateTime<Utc>, year: i32) -> Option<DateTime<Utc>> {
    let date = birth.date_naive();
    let moved = date
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))?;
    Some(moved.and_time(birth.time()).and_utc())
}

fn grid_search<F>(
    approx: DateTime<Utc>,
    config: &SolarReturnConfig,
    mut f: F,
) -> Result<DateTime<Utc>, SearchError>
where
    F: FnMut(DateTime<Utc>) -> Result<f64, SearchError>,
{
    let mut passes = vec![GridPass::new(
        hours_to_delta(config.coarse_half_window_hours, "coarse window out of range")?,
        hours_to_delta(config.coarse_step_hours, "coarse step out of range")?,
    )];
    for p in &config.refine_passes {
        passes.push(GridPass::new(
            minutes_to_delta(p.half_window_minutes, "refine window out of range")?,
            minutes_to_delta(p.step_minutes, "refine step out of range")?,
        ));
    }
    let best = refine_by_grid(approx, &passes, &mut f)?;
    debug!(instant = %best.instant, value = best.value, "solar return grid");
    if !config.final_bisection || best.value == 0.0 {
        return Ok(best.instant);
    }

    let one_minute = minutes_to_delta(1.0, "bisection window out of range")?;
    let (start, end) = window_around(best.instant, one_minute)?;
    let problem = RootFindProblem::new(start, end, one_minute * 2)
        .with_tolerances(
            seconds_to_delta(config.time_tolerance_seconds, "time tolerance out of range")?,
            config.degree_tolerance,
            config.max_iterations,
        )
        .with_widening(one_minute, config.max_widenings);
    let root = AngularRootFinder::new(problem)?.find_root(&mut f)?;
    Ok(root.instant)
}

fn bisection_search<F>(
    approx: DateTime<Utc>,
    config: &SolarReturnConfig,
    f: F,
) -> Result<DateTime<Utc>, SearchError>
where
    F: FnMut(DateTime<Utc>) -> Result<f64, SearchError>,
{
    let half = days_to_delta(config.bracket_half_window_days, "bracket out of range")?;
    let (start, end) = window_around(approx, half)?;
    let problem = RootFindProblem::new(start, end, half * 2)
        .with_tolerances(
            seconds_to_delta(config.time_tolerance_seconds, "time tolerance out of range")?,
            config.degree_tolerance,
            config.max_iterations,
        )
        .with_widening(
            days_to_delta(config.widen_days, "widening out of range")?,
            config.max_widenings,
        );
    let root = AngularRootFinder::new(problem)?.find_root(f)?;
    Ok(root.instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::{MeanMotionEphemeris, j2000};
    use chrono::{TimeDelta, TimeZone};

    const SUN_YEAR_DAYS: f64 = 360.0 / 0.985_647;

    fn analytic_return(years: f64) -> DateTime<Utc> {
        j2000() + TimeDelta::microseconds((years * SUN_YEAR_DAYS * 86_400_000_000.0).round() as i64)
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SolarReturnConfig::default().validate().is_ok());
        assert!(SolarReturnConfig::bisection().validate().is_ok());
    }

    #[test]
    fn invalid_config_rejected() {
        let eph = MeanMotionEphemeris::default();
        let cfg = SolarReturnConfig {
            coarse_step_hours: 0.0,
            ..SolarReturnConfig::default()
        };
        let err = exact_solar_return(&eph, 100.0, j2000(), &cfg).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(_)));
    }

    #[test]
    fn grid_method_matches_analytic_instant() {
        let eph = MeanMotionEphemeris::default();
        let approx = Utc.with_ymd_and_hms(2010, 1, 1, 12, 0, 0).unwrap();
        let sr = exact_solar_return(&eph, 100.0, approx, &SolarReturnConfig::default()).unwrap();
        let expected = analytic_return(10.0);
        assert!((sr.instant - expected).num_seconds().abs() < 60);
        assert!(sr.residual_deg.abs() < 1e-3);
        assert_eq!(sr.method, SolarReturnMethod::Grid);
    }

    #[test]
    fn bisection_method_matches_analytic_instant() {
        let eph = MeanMotionEphemeris::default();
        let approx = Utc.with_ymd_and_hms(2010, 1, 1, 12, 0, 0).unwrap();
        let sr = exact_solar_return(&eph, 100.0, approx, &SolarReturnConfig::bisection()).unwrap();
        let expected = analytic_return(10.0);
        assert!((sr.instant - expected).num_seconds().abs() < 60);
        assert!(sr.residual_deg.abs() < 1e-4);
    }

    #[test]
    fn bisection_widens_for_poor_guess() {
        let eph = MeanMotionEphemeris::default();
        // Nine days early: outside ±2 days, found after widening.
        let approx = analytic_return(10.0) - TimeDelta::days(9);
        let sr = exact_solar_return(&eph, 100.0, approx, &SolarReturnConfig::bisection()).unwrap();
        assert!((sr.instant - analytic_return(10.0)).num_seconds().abs() < 60);
    }

    #[test]
    fn same_date_handles_leap_day() {
        let birth = Utc.with_ymd_and_hms(2000, 2, 29, 6, 30, 0).unwrap();
        let moved = same_date_in_year(birth, 2001).unwrap();
        assert_eq!(moved, Utc.with_ymd_and_hms(2001, 2, 28, 6, 30, 0).unwrap());
        let leap = same_date_in_year(birth, 2004).unwrap();
        assert_eq!(leap, Utc.with_ymd_and_hms(2004, 2, 29, 6, 30, 0).unwrap());
    }

    #[test]
    fn for_year_uses_natal_longitude() {
        let eph = MeanMotionEphemeris::default();
        let birth = Utc.with_ymd_and_hms(1990, 7, 14, 3, 0, 0).unwrap();
        let natal = eph.longitude_of(Body::Sun, birth).unwrap().longitude_deg;
        let sr = solar_return_for_year(&eph, birth, 2025, &SolarReturnConfig::default()).unwrap();
        assert_eq!(sr.instant.year(), 2025);
        assert!((sr.sun_longitude - natal).abs() < 1e-3);
    }
}
