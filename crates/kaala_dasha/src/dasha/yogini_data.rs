//! Static data for the Yogini dasha system.
//!
//! 8 Yoginis, 36-year total cycle.

use crate::graha::Graha;

/// Yogini names (0-indexed).
pub const YOGINI_NAMES: [&str; 8] = [
    "Mangala", "Pingala", "Dhanya", "Bhramari", "Bhadrika", "Ulka", "Siddha", "Sankata",
];

/// Graha lord for each Yogini.
pub const YOGINI_LORDS: [Graha; 8] = [
    Graha::Chandra,
    Graha::Surya,
    Graha::Guru,
    Graha::Mangal,
    Graha::Buddh,
    Graha::Shani,
    Graha::Shukra,
    Graha::Rahu,
];

/// Periods in years (1..8).
pub const YOGINI_YEARS: [f64; 8] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

/// Pada (1..4, stored 0-based) → starting yogini index.
pub const YOGINI_START_FROM_PADA: [usize; 4] = [0, 1, 2, 3];
