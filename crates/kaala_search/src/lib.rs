//! Angular event search over an ephemeris: solar returns, transit aspects,
//! sign ingresses, and dasha timelines seeded from the Moon.
//!
//! This crate provides:
//! - `EphemerisPort`, the seam to any position provider, and a mean-motion
//!   provider for tests and quick answers
//! - A scan + bisect root finder for functions returning signed angles
//! - Solar return search (grid and bisection methods)
//! - Transit aspect and sign ingress search
//! - Dasha orchestration from the ephemeris Moon

pub mod dasha;
pub mod ephemeris;
pub mod error;
pub mod root_finder;
pub(crate) mod search_util;
pub mod solar_return;
pub mod transits;

pub use dasha::{
    birth_inputs_from_ephemeris, dasha_report_for_birth, dasha_snapshot_at,
    dasha_timeline_for_birth, moon_longitude_at,
};
pub use ephemeris::{
    ALL_BODIES, Body, BodyLongitude, EphemerisConfig, EphemerisPort, MeanMotionEphemeris, j2000,
};
pub use error::SearchError;
pub use root_finder::{
    AngularRootFinder, GridPass, Root, RootFindProblem, is_genuine_crossing, normalize_to_pm180,
    refine_by_grid,
};
pub use solar_return::{
    DEFAULT_REFINE_PASSES, RefinePass, SolarReturn, SolarReturnConfig, SolarReturnMethod,
    exact_solar_return, same_date_in_year, solar_return_for_year,
};
pub use transits::{
    ALL_ASPECTS, Aspect, IngressConfig, IngressEvent, NatalPoint, TransitConfig, TransitEvent,
    find_ingresses, find_transit_aspects,
};
