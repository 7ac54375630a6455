//! Transit search: aspects from moving bodies to fixed natal points, and
//! sign ingresses.
//!
//! Both searches sample each mover once per step, detect crossings in the
//! sampled series, and refine each crossing with [`AngularRootFinder`] on
//! the bracketing step.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use kaala_dasha::{Rashi, normalize_360};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ephemeris::{Body, EphemerisPort};
use crate::error::SearchError;
use crate::root_finder::{
    AngularRootFinder, MAX_SCAN_SAMPLES, RootFindProblem, is_genuine_crossing, normalize_to_pm180,
};
use crate::search_util::{minutes_to_delta, offset_from, positive, seconds_to_delta};

/// Classical aspects by angular separation.
///
/// Sextile, square and trine match on both sides of the target: a trine
/// is found at 120° and at 240° of mover-minus-target separation. A search
/// that only tracked the leading side would report half of these events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

pub const ALL_ASPECTS: [Aspect; 5] = [
    Aspect::Conjunction,
    Aspect::Sextile,
    Aspect::Square,
    Aspect::Trine,
    Aspect::Opposition,
];

impl Aspect {
    pub const fn angle(self) -> f64 {
        match self {
            Self::Conjunction => 0.0,
            Self::Sextile => 60.0,
            Self::Square => 90.0,
            Self::Trine => 120.0,
            Self::Opposition => 180.0,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Conjunction => "conjunction",
            Self::Sextile => "sextile",
            Self::Square => "square",
            Self::Trine => "trine",
            Self::Opposition => "opposition",
        }
    }

    /// Separations (mover minus target) at which the aspect is exact.
    ///
    /// Conjunction and opposition have one; the others occur on both sides.
    pub fn separations(self) -> Vec<f64> {
        match self {
            Self::Conjunction | Self::Opposition => vec![self.angle()],
            _ => vec![self.angle(), 360.0 - self.angle()],
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aspect {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ALL_ASPECTS
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(trimmed))
            .ok_or(SearchError::InvalidConfig("unknown aspect name"))
    }
}

/// A fixed natal longitude that movers are aspected against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalPoint {
    pub name: String,
    pub longitude: f64,
}

impl NatalPoint {
    pub fn new(name: impl Into<String>, longitude: f64) -> Self {
        Self {
            name: name.into(),
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    pub step_minutes: f64,
    /// Refined crossings with a larger residual are dropped.
    pub orb_deg: f64,
    pub time_tolerance_seconds: f64,
    pub max_iterations: u32,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            step_minutes: 60.0,
            orb_deg: 1.0,
            time_tolerance_seconds: 30.0,
            max_iterations: 60,
        }
    }
}

impl TransitConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !positive(self.step_minutes) {
            return Err("step_minutes must be positive");
        }
        if !self.orb_deg.is_finite() || self.orb_deg < 0.0 {
            return Err("orb_deg must be non-negative");
        }
        if !positive(self.time_tolerance_seconds) {
            return Err("time_tolerance_seconds must be positive");
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        Ok(())
    }
}

/// An exact aspect from a mover to a natal point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitEvent {
    pub instant: DateTime<Utc>,
    pub mover: Body,
    pub target: String,
    pub aspect: Aspect,
    /// Exact separation (mover minus target) in [0, 360).
    pub separation_deg: f64,
    pub mover_longitude: f64,
    pub target_longitude: f64,
    /// |separation error| at `instant`, in degrees.
    pub residual_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    pub step_minutes: f64,
    pub time_tolerance_seconds: f64,
    pub max_iterations: u32,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            step_minutes: 30.0,
            time_tolerance_seconds: 10.0,
            max_iterations: 60,
        }
    }
}

impl IngressConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !positive(self.step_minutes) {
            return Err("step_minutes must be positive");
        }
        if !positive(self.time_tolerance_seconds) {
            return Err("time_tolerance_seconds must be positive");
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        Ok(())
    }
}

/// A body crossing into a new sign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngressEvent {
    pub instant: DateTime<Utc>,
    pub body: Body,
    /// 0-based index of the sign entered (0 = Aries).
    pub sign_index: u8,
    /// Western name of the sign entered.
    pub sign: String,
    /// Western name of the sign left.
    pub from_sign: String,
    pub retrograde: bool,
    pub longitude: f64,
}

struct Sample {
    instant: DateTime<Utc>,
    longitude: f64,
}

fn sample_longitudes<E: EphemerisPort + ?Sized>(
    eph: &E,
    body: Body,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step_minutes: f64,
) -> Result<Vec<Sample>, SearchError> {
    let step = minutes_to_delta(step_minutes, "step out of range")?;
    if step <= TimeDelta::zero() {
        return Err(SearchError::InvalidConfig("step must be at least one microsecond"));
    }
    if end < start {
        return Err(SearchError::InvalidConfig("end must not precede start"));
    }
    if (end - start).num_milliseconds() / step.num_milliseconds().max(1) >= MAX_SCAN_SAMPLES {
        return Err(SearchError::InvalidConfig("too many samples for step"));
    }

    let mut out = Vec::new();
    let mut t = start;
    loop {
        out.push(Sample {
            instant: t,
            longitude: eph.longitude_of(body, t)?.longitude_deg,
        });
        if t >= end {
            break;
        }
        t = t
            .checked_add_signed(step)
            .ok_or(SearchError::InvalidConfig("search window out of representable range"))?
            .min(end);
    }
    Ok(out)
}

fn refine_crossing<F>(
    t_a: DateTime<Utc>,
    t_b: DateTime<Utc>,
    time_tolerance_seconds: f64,
    max_iterations: u32,
    f: F,
) -> Result<(DateTime<Utc>, f64), SearchError>
where
    F: FnMut(DateTime<Utc>) -> Result<f64, SearchError>,
{
    let problem = RootFindProblem::new(t_a, t_b, t_b - t_a).with_tolerances(
        seconds_to_delta(time_tolerance_seconds, "time tolerance out of range")?,
        1e-9,
        max_iterations,
    );
    let root = AngularRootFinder::new(problem)?.find_root(f)?;
    Ok((root.instant, root.value))
}

/// Exact aspects from `movers` to `natal_points` in `[start, end]`, in
/// chronological order.
pub fn find_transit_aspects<E: EphemerisPort + ?Sized>(
    eph: &E,
    natal_points: &[NatalPoint],
    movers: &[Body],
    aspects: &[Aspect],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    config: &TransitConfig,
) -> Result<Vec<TransitEvent>, SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;
    if natal_points.iter().any(|p| !p.longitude.is_finite()) {
        return Err(SearchError::InvalidConfig("natal point longitude must be finite"));
    }

    let mut events = Vec::new();
    for &mover in movers {
        let samples = sample_longitudes(eph, mover, start, end, config.step_minutes)?;
        for point in natal_points {
            let target_lon = normalize_360(point.longitude);
            for &aspect in aspects {
                for separation in aspect.separations() {
                    let aim = target_lon + separation;
                    let g = |lon: f64| normalize_to_pm180(lon - aim);

                    for (i, s) in samples.iter().enumerate() {
                        let v = g(s.longitude);
                        let hit = if v == 0.0 {
                            Some((s.instant, 0.0))
                        } else if let Some(prev) = i.checked_sub(1).map(|j| &samples[j]) {
                            let v_prev = g(prev.longitude);
                            if is_genuine_crossing(v_prev, v) {
                                Some(refine_crossing(
                                    prev.instant,
                                    s.instant,
                                    config.time_tolerance_seconds,
                                    config.max_iterations,
                                    |t| offset_from(eph, mover, aim, t),
                                )?)
                            } else {
                                None
                            }
                        } else {
                            None
                        };

                        let Some((instant, value)) = hit else {
                            continue;
                        };
                        if value.abs() > config.orb_deg {
                            continue;
                        }
                        let mover_longitude = eph.longitude_of(mover, instant)?.longitude_deg;
                        events.push(TransitEvent {
                            instant,
                            mover,
                            target: point.name.clone(),
                            aspect,
                            separation_deg: normalize_360(separation),
                            mover_longitude,
                            target_longitude: target_lon,
                            residual_deg: value.abs(),
                        });
                    }
                }
            }
        }
    }
    events.sort_by(|a, b| a.instant.cmp(&b.instant));
    debug!(count = events.len(), "transit aspects");
    Ok(events)
}

/// Sign changes of `movers` in `[start, end]`, in chronological order.
pub fn find_ingresses<E: EphemerisPort + ?Sized>(
    eph: &E,
    movers: &[Body],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    config: &IngressConfig,
) -> Result<Vec<IngressEvent>, SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;

    let mut events = Vec::new();
    for &body in movers {
        let samples = sample_longitudes(eph, body, start, end, config.step_minutes)?;
        for pair in samples.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let from = Rashi::from_longitude(a.longitude);
            let to = Rashi::from_longitude(b.longitude);
            if from == to {
                continue;
            }
            let retrograde = normalize_to_pm180(b.longitude - a.longitude) < 0.0;
            let boundary = if retrograde {
                from.start_longitude()
            } else {
                to.start_longitude()
            };
            let f = |t: DateTime<Utc>| offset_from(eph, body, boundary, t);
            let (f_a, f_b) = (
                normalize_to_pm180(a.longitude - boundary),
                normalize_to_pm180(b.longitude - boundary),
            );
            let instant = if f_a == 0.0 {
                a.instant
            } else if f_b == 0.0 {
                b.instant
            } else if is_genuine_crossing(f_a, f_b) {
                refine_crossing(
                    a.instant,
                    b.instant,
                    config.time_tolerance_seconds,
                    config.max_iterations,
                    f,
                )?
                .0
            } else {
                warn!(
                    %body,
                    from = from.western_name(),
                    to = to.western_name(),
                    "ingress not bracketed; step too coarse"
                );
                b.instant
            };
            events.push(IngressEvent {
                instant,
                body,
                sign_index: to.index(),
                sign: to.western_name().to_string(),
                from_sign: from.western_name().to_string(),
                retrograde,
                longitude: eph.longitude_of(body, instant)?.longitude_deg,
            });
        }
    }
    events.sort_by(|a, b| a.instant.cmp(&b.instant));
    debug!(count = events.len(), "ingresses");
    Ok(events)
}
