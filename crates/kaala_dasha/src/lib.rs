//! Classical dasha timelines computed from the Moon's sidereal longitude.
//!
//! This crate is pure math: it takes a birth instant and a longitude and
//! produces immutable period trees. Ephemeris access lives in
//! `kaala_search`.

pub mod dasha;
pub mod error;
pub mod graha;
pub mod nakshatra;
pub mod rashi;
pub mod util;

pub use error::DashaError;
pub use graha::{ALL_GRAHAS, Graha, rashi_lord};
pub use nakshatra::{ALL_NAKSHATRAS_27, NAKSHATRA_SPAN_27, Nakshatra, NakshatraPosition, PADA_SPAN};
pub use rashi::{ALL_RASHIS, RASHI_SPAN, Rashi};
pub use util::normalize_360;
