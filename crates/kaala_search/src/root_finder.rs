//! Root finding for angular functions of time.
//!
//! The functions searched here return a signed angle normalized to
//! (-180, 180]. Such a function jumps from about +180 to about -180 where
//! the underlying separation passes the antipode, which looks like a sign
//! change but is not a root. Crossings are therefore only accepted when the
//! jump between neighbouring samples is small (see [`is_genuine_crossing`]).
//!
//! Two strategies are provided:
//! - scan + bisect ([`AngularRootFinder::find_root`],
//!   [`AngularRootFinder::find_all_roots`])
//! - nested grid minimization of |f| ([`refine_by_grid`])

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace};

use crate::error::SearchError;

/// Upper bound on samples taken by a single scan or grid pass.
pub const MAX_SCAN_SAMPLES: i64 = 2_000_000;

/// Normalize an angle difference to (-180, 180].
pub fn normalize_to_pm180(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Opposite signs and a jump under 270°: a real zero crossing rather than a
/// ±180 wraparound.
pub fn is_genuine_crossing(f_a: f64, f_b: f64) -> bool {
    f_a * f_b < 0.0 && (f_a - f_b).abs() < 270.0
}

/// Window and tolerances for a scan + bisect search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootFindProblem {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Sampling step of the scan.
    pub step: TimeDelta,
    /// Bisection stops once the bracket is no wider than this.
    pub time_tolerance: TimeDelta,
    /// Bisection stops once |f| is below this many degrees.
    pub degree_tolerance: f64,
    pub max_iterations: u32,
    /// Amount added to each side of the window per widening.
    pub widen_by: TimeDelta,
    pub max_widenings: u32,
}

impl RootFindProblem {
    /// A problem over `[window_start, window_end]` with one-second time
    /// tolerance and no widening.
    pub fn new(window_start: DateTime<Utc>, window_end: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            window_start,
            window_end,
            step,
            time_tolerance: TimeDelta::seconds(1),
            degree_tolerance: 1e-7,
            max_iterations: 60,
            widen_by: TimeDelta::zero(),
            max_widenings: 0,
        }
    }

    pub fn with_tolerances(
        mut self,
        time_tolerance: TimeDelta,
        degree_tolerance: f64,
        max_iterations: u32,
    ) -> Self {
        self.time_tolerance = time_tolerance;
        self.degree_tolerance = degree_tolerance;
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_widening(mut self, widen_by: TimeDelta, max_widenings: u32) -> Self {
        self.widen_by = widen_by;
        self.max_widenings = max_widenings;
        self
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.window_end < self.window_start {
            return Err("window_end must not precede window_start");
        }
        if self.step <= TimeDelta::zero() {
            return Err("step must be positive");
        }
        if self.time_tolerance <= TimeDelta::zero() {
            return Err("time_tolerance must be positive");
        }
        if !self.degree_tolerance.is_finite() || self.degree_tolerance < 0.0 {
            return Err("degree_tolerance must be non-negative and finite");
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        if self.widen_by < TimeDelta::zero() {
            return Err("widen_by must not be negative");
        }
        if self.max_widenings > 0 && self.widen_by.is_zero() {
            return Err("widen_by must be positive when widening is enabled");
        }
        Ok(())
    }
}

/// A located root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub instant: DateTime<Utc>,
    /// f at `instant`, in degrees.
    pub value: f64,
    /// Function evaluations spent refining this root.
    pub iterations: u32,
}

/// Scan + bisect search over one [`RootFindProblem`].
#[derive(Debug, Clone, Copy)]
pub struct AngularRootFinder {
    problem: RootFindProblem,
}

impl AngularRootFinder {
    pub fn new(problem: RootFindProblem) -> Result<Self, SearchError> {
        problem.validate().map_err(SearchError::InvalidConfig)?;
        Ok(Self { problem })
    }

    pub fn problem(&self) -> &RootFindProblem {
        &self.problem
    }

    /// First root in the window, widening symmetrically while none is found.
    pub fn find_root<F>(&self, mut f: F) -> Result<Root, SearchError>
    where
        F: FnMut(DateTime<Utc>) -> Result<f64, SearchError>,
    {
        let p = &self.problem;
        let mut start = p.window_start;
        let mut end = p.window_end;
        for attempt in 0..=p.max_widenings {
            if attempt > 0 {
                start = shift(start, -p.widen_by)?;
                end = shift(end, p.widen_by)?;
                debug!(attempt, %start, %end, "widening root search window");
            }
            if let Some(root) = self.scan(start, end, &mut f, true)?.into_iter().next() {
                return Ok(root);
            }
        }
        Err(SearchError::NoSolutionFound {
            window_start: start,
            window_end: end,
            attempts: p.max_widenings + 1,
        })
    }

    /// Every root in the window in chronological order. No widening.
    pub fn find_all_roots<F>(&self, mut f: F) -> Result<Vec<Root>, SearchError>
    where
        F: FnMut(DateTime<Utc>) -> Result<f64, SearchError>,
    {
        self.scan(self.problem.window_start, self.problem.window_end, &mut f, false)
    }

    fn scan<F>(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        f: &mut F,
        first_only: bool,
    ) -> Result<Vec<Root>, SearchError>
    where
        F: FnMut(DateTime<Utc>) -> Result<f64, SearchError>,
    {
        let step = self.problem.step;
        check_sample_count(end - start, step)?;

        let mut roots = Vec::new();
        let mut prev: Option<(DateTime<Utc>, f64)> = None;
        let mut t = start;
        loop {
            let v = f(t)?;
            if v == 0.0 {
                roots.push(Root {
                    instant: t,
                    value: 0.0,
                    iterations: 0,
                });
            } else if let Some((t_prev, v_prev)) = prev {
                if is_genuine_crossing(v_prev, v) {
                    roots.push(self.bisect(t_prev, v_prev, t, v, f)?);
                }
            }
            if first_only && !roots.is_empty() {
                break;
            }
            if t >= end {
                break;
            }
            prev = Some((t, v));
            t = shift(t, step)?.min(end);
        }
        Ok(roots)
    }

    fn bisect<F>(
        &self,
        mut t_a: DateTime<Utc>,
        mut f_a: f64,
        mut t_b: DateTime<Utc>,
        mut f_b: f64,
        f: &mut F,
    ) -> Result<Root, SearchError>
    where
        F: FnMut(DateTime<Utc>) -> Result<f64, SearchError>,
    {
        let p = &self.problem;
        let mut iterations = 0;
        while iterations < p.max_iterations && t_b - t_a > p.time_tolerance {
            let t_mid = t_a + (t_b - t_a) / 2;
            let f_mid = f(t_mid)?;
            iterations += 1;
            trace!(%t_mid, f_mid, "bisection step");

            if f_mid.abs() < p.degree_tolerance {
                return Ok(Root {
                    instant: t_mid,
                    value: f_mid,
                    iterations,
                });
            }
            if f_a * f_mid <= 0.0 {
                t_b = t_mid;
                f_b = f_mid;
            } else {
                t_a = t_mid;
                f_a = f_mid;
            }
        }
        let (instant, value) = if f_a.abs() <= f_b.abs() {
            (t_a, f_a)
        } else {
            (t_b, f_b)
        };
        Ok(Root {
            instant,
            value,
            iterations,
        })
    }
}

/// One pass of [`refine_by_grid`]: sample `center ± half_window` every `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPass {
    pub half_window: TimeDelta,
    pub step: TimeDelta,
}

impl GridPass {
    pub fn new(half_window: TimeDelta, step: TimeDelta) -> Self {
        Self { half_window, step }
    }
}

/// Minimize |f| on successively finer grids, each centered on the previous
/// best sample.
pub fn refine_by_grid<F>(
    center: DateTime<Utc>,
    passes: &[GridPass],
    mut f: F,
) -> Result<Root, SearchError>
where
    F: FnMut(DateTime<Utc>) -> Result<f64, SearchError>,
{
    if passes.is_empty() {
        return Err(SearchError::InvalidConfig("at least one grid pass is required"));
    }
    let mut best = Root {
        instant: center,
        value: f(center)?,
        iterations: 1,
    };
    let mut evaluations = 1;
    for pass in passes {
        if pass.step <= TimeDelta::zero() || pass.half_window < TimeDelta::zero() {
            return Err(SearchError::InvalidConfig(
                "grid pass needs a positive step and non-negative half window",
            ));
        }
        check_sample_count(pass.half_window * 2, pass.step)?;

        let end = shift(best.instant, pass.half_window)?;
        let mut t = shift(best.instant, -pass.half_window)?;
        let mut pass_best = best;
        while t <= end {
            let v = f(t)?;
            evaluations += 1;
            if v.abs() < pass_best.value.abs() {
                pass_best = Root {
                    instant: t,
                    value: v,
                    iterations: evaluations,
                };
            }
            t = shift(t, pass.step)?;
        }
        trace!(instant = %pass_best.instant, value = pass_best.value, "grid pass");
        best = pass_best;
    }
    best.iterations = evaluations;
    Ok(best)
}

fn shift(t: DateTime<Utc>, delta: TimeDelta) -> Result<DateTime<Utc>, SearchError> {
    t.checked_add_signed(delta)
        .ok_or(SearchError::InvalidConfig("search window out of representable range"))
}

fn check_sample_count(span: TimeDelta, step: TimeDelta) -> Result<(), SearchError> {
    let step_ms = step.num_milliseconds().max(1);
    if span.num_milliseconds() / step_ms >= MAX_SCAN_SAMPLES {
        return Err(SearchError::InvalidConfig("too many samples for step"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn hours_since(t: DateTime<Utc>) -> f64 {
        (t - t0()).num_milliseconds() as f64 / 3_600_000.0
    }

    #[test]
    fn normalize_pm180_basic() {
        assert!((normalize_to_pm180(190.0) - (-170.0)).abs() < 1e-12);
        assert!((normalize_to_pm180(-190.0) - 170.0).abs() < 1e-12);
        assert!((normalize_to_pm180(180.0) - 180.0).abs() < 1e-12);
        assert!((normalize_to_pm180(-180.0) - 180.0).abs() < 1e-12);
        assert!((normalize_to_pm180(720.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn genuine_crossing_rejects_wraparound() {
        assert!(is_genuine_crossing(-1.0, 2.0));
        assert!(!is_genuine_crossing(179.0, -179.0));
        assert!(!is_genuine_crossing(1.0, 2.0));
    }

    #[test]
    fn validate_rejects_bad_problems() {
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(1), TimeDelta::zero());
        assert!(p.validate().is_err());
        let p = RootFindProblem::new(t0() + TimeDelta::hours(1), t0(), TimeDelta::minutes(1));
        assert!(p.validate().is_err());
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(1), TimeDelta::minutes(1))
            .with_widening(TimeDelta::zero(), 3);
        assert!(matches!(
            AngularRootFinder::new(p),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn linear_root_within_tolerance() {
        // f = (t - 10.25h) degrees per hour, root at 10:15.
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(24), TimeDelta::hours(1));
        let finder = AngularRootFinder::new(p).unwrap();
        let root = finder.find_root(|t| Ok(hours_since(t) - 10.25)).unwrap();
        let expected = t0() + TimeDelta::minutes(615);
        assert!((root.instant - expected).num_milliseconds().abs() <= 1000);
    }

    #[test]
    fn exact_zero_sample_is_returned() {
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(24), TimeDelta::hours(1));
        let finder = AngularRootFinder::new(p).unwrap();
        let root = finder.find_root(|t| Ok(hours_since(t) - 5.0)).unwrap();
        assert_eq!(root.instant, t0() + TimeDelta::hours(5));
        assert_eq!(root.iterations, 0);
    }

    #[test]
    fn no_sign_change_is_no_solution() {
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(24), TimeDelta::hours(1));
        let finder = AngularRootFinder::new(p).unwrap();
        let err = finder.find_root(|_| Ok(5.0)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::NoSolutionFound { attempts: 1, .. }
        ));
    }

    #[test]
    fn wraparound_is_not_a_root() {
        // Sawtooth that wraps from +179 to -179 at hour 12 and never crosses zero.
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(24), TimeDelta::hours(1));
        let finder = AngularRootFinder::new(p).unwrap();
        let result = finder.find_root(|t| {
            let h = hours_since(t);
            Ok(normalize_to_pm180(170.0 + h))
        });
        assert!(matches!(result, Err(SearchError::NoSolutionFound { .. })));
    }

    #[test]
    fn widening_reaches_root_outside_window() {
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(2), TimeDelta::minutes(30))
            .with_widening(TimeDelta::hours(2), 5);
        let finder = AngularRootFinder::new(p).unwrap();
        let root = finder.find_root(|t| Ok(hours_since(t) - 7.5)).unwrap();
        let expected = t0() + TimeDelta::minutes(450);
        assert!((root.instant - expected).num_milliseconds().abs() <= 1000);
    }

    #[test]
    fn widening_gives_up_with_attempt_count() {
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(2), TimeDelta::minutes(30))
            .with_widening(TimeDelta::hours(1), 3);
        let finder = AngularRootFinder::new(p).unwrap();
        let err = finder.find_root(|_| Ok(-1.0)).unwrap_err();
        match err {
            SearchError::NoSolutionFound {
                window_start,
                window_end,
                attempts,
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(window_start, t0() - TimeDelta::hours(3));
                assert_eq!(window_end, t0() + TimeDelta::hours(5));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn find_all_roots_in_order() {
        // Slow sine in degrees: zero at 0h, 6h, 12h, 18h, 24h.
        let p = RootFindProblem::new(
            t0() + TimeDelta::minutes(1),
            t0() + TimeDelta::hours(23),
            TimeDelta::minutes(45),
        );
        let finder = AngularRootFinder::new(p).unwrap();
        let roots = finder
            .find_all_roots(|t| {
                let h = hours_since(t);
                Ok(10.0 * (h * std::f64::consts::PI / 6.0).sin())
            })
            .unwrap();
        assert_eq!(roots.len(), 3);
        for (root, hours) in roots.iter().zip([6, 12, 18]) {
            let expected = t0() + TimeDelta::hours(hours);
            assert!((root.instant - expected).num_milliseconds().abs() <= 1000);
        }
    }

    #[test]
    fn errors_from_f_propagate() {
        let p = RootFindProblem::new(t0(), t0() + TimeDelta::hours(2), TimeDelta::minutes(30));
        let finder = AngularRootFinder::new(p).unwrap();
        let err = finder
            .find_root(|_| Err(SearchError::Ephemeris("offline".into())))
            .unwrap_err();
        assert_eq!(err, SearchError::Ephemeris("offline".into()));
    }

    #[test]
    fn grid_refinement_converges() {
        let target = t0() + TimeDelta::minutes(613);
        let passes = [
            GridPass::new(TimeDelta::hours(2), TimeDelta::minutes(20)),
            GridPass::new(TimeDelta::minutes(40), TimeDelta::minutes(5)),
            GridPass::new(TimeDelta::minutes(10), TimeDelta::minutes(1)),
        ];
        let best = refine_by_grid(t0() + TimeDelta::hours(10), &passes, |t| {
            Ok((t - target).num_seconds() as f64 / 3600.0)
        })
        .unwrap();
        assert_eq!(best.instant, target);
    }

    #[test]
    fn grid_refinement_needs_passes() {
        let err = refine_by_grid(t0(), &[], |_| Ok(1.0)).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(_)));
    }

    #[test]
    fn oversized_scan_rejected() {
        let p = RootFindProblem::new(
            t0(),
            t0() + TimeDelta::days(365 * 100),
            TimeDelta::seconds(1),
        );
        let finder = AngularRootFinder::new(p).unwrap();
        assert!(matches!(
            finder.find_root(|_| Ok(1.0)),
            Err(SearchError::InvalidConfig(_))
        ));
    }
}
