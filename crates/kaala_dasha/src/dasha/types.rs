//! Core types for dasha (planetary period) calculations.
//!
//! Dashas are hierarchical time-period systems: a lifespan is split into
//! mahadashas, each mahadasha into antardashas, and so on. This module
//! defines the data structures shared by all four supported systems.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::DashaError;
use crate::graha::{Graha, rashi_lord};
use crate::rashi::Rashi;
use crate::util::delta_days;

use super::yogini_data::{YOGINI_LORDS, YOGINI_NAMES};

/// Year length used for every weight-to-calendar conversion.
pub const DAYS_PER_YEAR: f64 = 365.2425;

/// Maximum dasha depth. Levels 0-4 supported.
pub const MAX_DASHA_LEVEL: u8 = 4;

/// Default depth for builds and queries (mahadasha → pratyantardasha).
pub const DEFAULT_DASHA_LEVEL: u8 = 2;

/// Deepest level a builder materializes for every parent. Deeper levels are
/// computed on demand for the active chain only.
pub const MAX_EAGER_DASHA_LEVEL: u8 = 2;

/// Hard cap on periods per level to prevent combinatorial explosion.
pub const MAX_PERIODS_PER_LEVEL: usize = 100_000;

/// Default span of the top-level sequence past birth.
pub const DEFAULT_HORIZON_YEARS: f64 = 180.0;

/// 5 hierarchical dasha levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DashaLevel {
    Mahadasha = 0,
    Antardasha = 1,
    Pratyantardasha = 2,
    Sookshmadasha = 3,
    Pranadasha = 4,
}

impl DashaLevel {
    /// Create from raw u8 value.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Mahadasha),
            1 => Some(Self::Antardasha),
            2 => Some(Self::Pratyantardasha),
            3 => Some(Self::Sookshmadasha),
            4 => Some(Self::Pranadasha),
            _ => None,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mahadasha => "Mahadasha",
            Self::Antardasha => "Antardasha",
            Self::Pratyantardasha => "Pratyantardasha",
            Self::Sookshmadasha => "Sookshmadasha",
            Self::Pranadasha => "Pranadasha",
        }
    }

    /// Next deeper level, if any.
    pub const fn child_level(self) -> Option<Self> {
        match self {
            Self::Mahadasha => Some(Self::Antardasha),
            Self::Antardasha => Some(Self::Pratyantardasha),
            Self::Pratyantardasha => Some(Self::Sookshmadasha),
            Self::Sookshmadasha => Some(Self::Pranadasha),
            Self::Pranadasha => None,
        }
    }
}

/// What entity rules a dasha period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashaEntity {
    /// Vimshottari and Ashtottari lords.
    Graha(Graha),
    /// Yogini system (0-based, 0..7 for 8 yoginis).
    Yogini(u8),
    /// Kalachakra signs.
    Rashi(Rashi),
}

impl DashaEntity {
    /// Display label: English graha name, yogini name or western sign name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Graha(g) => g.english_name(),
            Self::Yogini(y) => YOGINI_NAMES.get(*y as usize).copied().unwrap_or("Unknown"),
            Self::Rashi(r) => r.western_name(),
        }
    }

    /// Planetary lord behind the entity.
    pub fn lord(&self) -> Option<Graha> {
        match self {
            Self::Graha(g) => Some(*g),
            Self::Yogini(y) => YOGINI_LORDS.get(*y as usize).copied(),
            Self::Rashi(r) => Some(rashi_lord(*r)),
        }
    }
}

/// A single dasha period, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashaPeriod {
    /// The entity ruling this period.
    pub entity: DashaEntity,
    /// Inclusive.
    pub start: DateTime<Utc>,
    /// Exclusive.
    pub end: DateTime<Utc>,
    /// Hierarchical level.
    pub level: DashaLevel,
    /// 1-indexed position among siblings.
    pub order: u16,
    /// Index into parent level's array (0 for level 0).
    pub parent_idx: u32,
}

impl DashaPeriod {
    /// Wall-clock length of the period.
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Duration of the period in days.
    pub fn duration_days(&self) -> f64 {
        delta_days(self.duration())
    }

    /// Duration in classical years of `DAYS_PER_YEAR` days.
    pub fn duration_years(&self) -> f64 {
        self.duration_days() / DAYS_PER_YEAR
    }

    /// Whether `instant` falls inside `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn label(&self) -> &'static str {
        self.entity.label()
    }
}

/// The four supported dasha systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DashaSystem {
    Vimshottari,
    Yogini,
    Ashtottari,
    Kalachakra,
}

/// All supported systems in report order.
pub const ALL_DASHA_SYSTEMS: [DashaSystem; 4] = [
    DashaSystem::Vimshottari,
    DashaSystem::Yogini,
    DashaSystem::Ashtottari,
    DashaSystem::Kalachakra,
];

impl DashaSystem {
    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vimshottari => "Vimshottari",
            Self::Yogini => "Yogini",
            Self::Ashtottari => "Ashtottari",
            Self::Kalachakra => "Kalachakra",
        }
    }

    /// Parse a system name case-insensitively. Accepts the common
    /// alternate spelling "Kaal Chakra".
    pub fn from_name(s: &str) -> Result<Self, DashaError> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "vimshottari" | "vimsottari" => Ok(Self::Vimshottari),
            "yogini" => Ok(Self::Yogini),
            "ashtottari" => Ok(Self::Ashtottari),
            "kalachakra" | "kaalchakra" => Ok(Self::Kalachakra),
            _ => Err(DashaError::UnknownSystem(s.to_string())),
        }
    }
}

impl std::fmt::Display for DashaSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Active periods at a specific instant (one per requested level).
#[derive(Debug, Clone)]
pub struct DashaSnapshot {
    /// Which system produced this snapshot.
    pub system: DashaSystem,
    /// The queried instant.
    pub query: DateTime<Utc>,
    /// False when the query lay outside the built horizon and the first or
    /// last top-level period was substituted.
    pub within_horizon: bool,
    /// Active periods: periods[0]=active mahadasha, [1]=active antardasha, etc.
    pub periods: Vec<DashaPeriod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_round_trip() {
        for v in 0..=MAX_DASHA_LEVEL {
            let level = DashaLevel::from_u8(v).unwrap();
            assert_eq!(level as u8, v);
        }
        assert!(DashaLevel::from_u8(5).is_none());
        assert!(DashaLevel::Pranadasha.child_level().is_none());
    }

    #[test]
    fn system_names_parse() {
        for s in ALL_DASHA_SYSTEMS {
            assert_eq!(DashaSystem::from_name(s.name()).unwrap(), s);
        }
        assert_eq!(DashaSystem::from_name("Kaal Chakra").unwrap(), DashaSystem::Kalachakra);
        assert!(matches!(
            DashaSystem::from_name("chara"),
            Err(DashaError::UnknownSystem(_))
        ));
    }

    #[test]
    fn entity_labels_and_lords() {
        assert_eq!(DashaEntity::Graha(Graha::Shukra).label(), "Venus");
        assert_eq!(DashaEntity::Yogini(7).label(), "Sankata");
        assert_eq!(DashaEntity::Yogini(7).lord(), Some(Graha::Rahu));
        assert_eq!(DashaEntity::Rashi(Rashi::Karka).label(), "Cancer");
        assert_eq!(DashaEntity::Rashi(Rashi::Karka).lord(), Some(Graha::Chandra));
    }
}
