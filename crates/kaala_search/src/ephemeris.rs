//! Ephemeris port and a mean-motion provider.
//!
//! Searches only ever ask for a sidereal longitude and its daily motion, so
//! any provider (a JPL kernel reader, a remote service, a fixture) can sit
//! behind [`EphemerisPort`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use kaala_dasha::normalize_360;
use kaala_dasha::util::delta_days;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Bodies a provider can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    /// Mean ascending lunar node.
    Rahu,
    /// Mean descending lunar node.
    Ketu,
}

/// All bodies in declaration order.
pub const ALL_BODIES: [Body; 12] = [
    Body::Sun,
    Body::Moon,
    Body::Mercury,
    Body::Venus,
    Body::Mars,
    Body::Jupiter,
    Body::Saturn,
    Body::Uranus,
    Body::Neptune,
    Body::Pluto,
    Body::Rahu,
    Body::Ketu,
];

impl Body {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Moon => "Moon",
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
            Self::Pluto => "Pluto",
            Self::Rahu => "Rahu",
            Self::Ketu => "Ketu",
        }
    }

    /// Mean sidereal motion in degrees per day.
    pub const fn mean_daily_motion(self) -> f64 {
        match self {
            Self::Sun => 0.985_647,
            Self::Moon => 13.176_358,
            Self::Mercury => 4.092_385,
            Self::Venus => 1.602_130,
            Self::Mars => 0.524_039,
            Self::Jupiter => 0.083_056,
            Self::Saturn => 0.033_439,
            Self::Uranus => 0.011_958,
            Self::Neptune => 0.006_886,
            Self::Pluto => 0.004,
            Self::Rahu | Self::Ketu => -NODE_DAILY_MOTION,
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Body {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ALL_BODIES
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SearchError::UnknownBody(trimmed.to_string()))
    }
}

/// A body's sidereal longitude and instantaneous motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyLongitude {
    /// Sidereal longitude in [0, 360).
    pub longitude_deg: f64,
    /// Degrees per day; negative when retrograde.
    pub speed_deg_per_day: f64,
}

/// Source of sidereal body positions.
///
/// Implementations must be synchronous and idempotent: the same body and
/// instant always yield the same result.
pub trait EphemerisPort {
    fn longitude_of(&self, body: Body, instant: DateTime<Utc>)
    -> Result<BodyLongitude, SearchError>;
}

impl<T: EphemerisPort + ?Sized> EphemerisPort for &T {
    fn longitude_of(
        &self,
        body: Body,
        instant: DateTime<Utc>,
    ) -> Result<BodyLongitude, SearchError> {
        (**self).longitude_of(body, instant)
    }
}

const NODE_DAILY_MOTION: f64 = 0.052_953_9;
const PLANET_EPOCH_LONGITUDE: f64 = 100.0;
const NODE_EPOCH_LONGITUDE: f64 = 200.0;

/// J2000.0 (2000-01-01T12:00:00Z).
pub fn j2000() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Provider settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EphemerisConfig {
    /// Instant at which the epoch longitudes hold.
    pub epoch: DateTime<Utc>,
    /// Degrees subtracted from every longitude.
    pub ayanamsha: f64,
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        Self {
            epoch: j2000(),
            ayanamsha: 0.0,
        }
    }
}

impl EphemerisConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.ayanamsha.is_finite() {
            return Err("ayanamsha must be finite");
        }
        Ok(())
    }
}

/// Coarse provider that advances every body at its mean daily motion.
///
/// Accuracy is nowhere near a real ephemeris; positions are smooth, which is
/// what the searches need for tests, benchmarks and quick CLI answers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanMotionEphemeris {
    config: EphemerisConfig,
}

impl MeanMotionEphemeris {
    pub fn new(config: EphemerisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EphemerisConfig {
        &self.config
    }

    fn raw_longitude(&self, body: Body, days: f64) -> f64 {
        match body {
            Body::Rahu => NODE_EPOCH_LONGITUDE - NODE_DAILY_MOTION * days,
            Body::Ketu => NODE_EPOCH_LONGITUDE - NODE_DAILY_MOTION * days + 180.0,
            _ => PLANET_EPOCH_LONGITUDE + body.mean_daily_motion() * days,
        }
    }
}

impl Default for MeanMotionEphemeris {
    fn default() -> Self {
        Self::new(EphemerisConfig::default())
    }
}

impl EphemerisPort for MeanMotionEphemeris {
    fn longitude_of(
        &self,
        body: Body,
        instant: DateTime<Utc>,
    ) -> Result<BodyLongitude, SearchError> {
        let days = delta_days(instant - self.config.epoch);
        let lon = self.raw_longitude(body, days) - self.config.ayanamsha;
        if !lon.is_finite() {
            return Err(SearchError::Ephemeris(format!(
                "non-finite longitude for {body} at {instant}"
            )));
        }
        Ok(BodyLongitude {
            longitude_deg: normalize_360(lon),
            speed_deg_per_day: body.mean_daily_motion(),
        })
    }
}
