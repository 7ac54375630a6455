//! Dasha orchestration: reads the Moon from an ephemeris and hands the
//! longitude to the pure-math timeline builder in kaala_dasha.

use chrono::{DateTime, Utc};
use kaala_dasha::dasha::{
    ActivePeriodLocator, BirthInputs, DashaReport, DashaSnapshot, DashaSystem, TimelineBuilder,
    TimelineConfig, TimelineOutcome,
};
use tracing::debug;

use crate::ephemeris::{Body, EphemerisPort};
use crate::error::SearchError;

/// Moon's sidereal longitude at `instant`.
pub fn moon_longitude_at<E: EphemerisPort + ?Sized>(
    eph: &E,
    instant: DateTime<Utc>,
) -> Result<f64, SearchError> {
    Ok(eph.longitude_of(Body::Moon, instant)?.longitude_deg)
}

/// Birth inputs with the Moon read from `eph`.
pub fn birth_inputs_from_ephemeris<E: EphemerisPort + ?Sized>(
    eph: &E,
    birth: DateTime<Utc>,
) -> Result<BirthInputs, SearchError> {
    let moon = moon_longitude_at(eph, birth)?;
    debug!(%birth, moon, "moon longitude for dasha");
    Ok(BirthInputs::new(birth, moon))
}

/// Build one system's timeline for a birth instant.
pub fn dasha_timeline_for_birth<E: EphemerisPort + ?Sized>(
    eph: &E,
    birth: DateTime<Utc>,
    system: DashaSystem,
    config: &TimelineConfig,
) -> Result<TimelineOutcome, SearchError> {
    let inputs = birth_inputs_from_ephemeris(eph, birth)?;
    Ok(TimelineBuilder::new(system, *config).build(&inputs)?)
}

/// Active periods of one system at `query`; `None` when the system does
/// not apply to this birth.
pub fn dasha_snapshot_at<E: EphemerisPort + ?Sized>(
    eph: &E,
    birth: DateTime<Utc>,
    system: DashaSystem,
    query: DateTime<Utc>,
    config: &TimelineConfig,
) -> Result<Option<DashaSnapshot>, SearchError> {
    let outcome = dasha_timeline_for_birth(eph, birth, system, config)?;
    let Some(tree) = outcome.tree() else {
        return Ok(None);
    };
    Ok(Some(ActivePeriodLocator::new(tree).snapshot(query, config.depth)?))
}

/// Report across `systems` for a birth instant.
pub fn dasha_report_for_birth<E: EphemerisPort + ?Sized>(
    eph: &E,
    birth: DateTime<Utc>,
    systems: &[DashaSystem],
    query: DateTime<Utc>,
    config: &TimelineConfig,
) -> Result<DashaReport, SearchError> {
    let inputs = birth_inputs_from_ephemeris(eph, birth)?;
    Ok(DashaReport::for_birth(&inputs, systems, query, config)?)
}
