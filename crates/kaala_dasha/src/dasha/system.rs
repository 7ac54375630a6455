//! The strategy contract shared by every dasha system.
//!
//! A system is a cyclic sequence of weighted slots, a rule that places the
//! birth instant inside one of those slots, and a rule that derives the
//! ordered children of any period. [`SystemRules`] is the closed set of
//! implementations the builder dispatches over.

use crate::error::DashaError;
use crate::nakshatra::NakshatraPosition;

use super::kalachakra::{KalachakraMeta, KalachakraRules};
use super::nakshatra_rules::{NakshatraDashaRules, ashtottari_rules, vimshottari_rules};
use super::types::{DashaEntity, DashaSystem};
use super::yogini::YoginiRules;

/// One entry of a cyclic sequence: who rules, and for how many years.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub entity: DashaEntity,
    pub weight_years: f64,
}

impl Slot {
    pub const fn new(entity: DashaEntity, weight_years: f64) -> Self {
        Self {
            entity,
            weight_years,
        }
    }
}

/// Where the birth instant falls in the top-level sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartingState {
    /// Index into `top_level_sequence()` of the birth mahadasha.
    pub start_index: usize,
    /// Fraction of the first slot already elapsed at birth, [0, 1].
    pub elapsed_fraction: f64,
    /// Nominal weight (years) of the first slot.
    pub first_slot_weight: f64,
}

impl StartingState {
    /// Remaining years of the birth mahadasha.
    pub fn balance_years(&self) -> f64 {
        self.first_slot_weight * (1.0 - self.elapsed_fraction)
    }
}

/// A legitimate "no timeline" result for a system and birth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inapplicable {
    /// The system's applicability rule excludes this birth.
    NotApplicable { reason: String },
    /// A birth input could not be mapped onto the system's tables.
    UnsupportedMapping { input: String },
}

/// Contract implemented by each dasha system.
pub trait PeriodSystem {
    /// Which system these rules describe.
    fn system(&self) -> DashaSystem;

    /// Ordered, cyclic top-level sequence.
    fn top_level_sequence(&self) -> &[Slot];

    /// Birth mahadasha and the fraction of it already elapsed.
    fn starting_state(&self, position: &NakshatraPosition) -> Result<StartingState, Inapplicable>;

    /// Ordered children of a period ruled by `parent`.
    fn child_sequence(&self, parent: DashaEntity) -> Result<Vec<Slot>, DashaError>;

    /// Sum of all top-level weights.
    fn total_cycle_weight(&self) -> f64 {
        self.top_level_sequence().iter().map(|s| s.weight_years).sum()
    }
}

/// The sequence rotated so that `parent` comes first.
pub fn rotate_from(sequence: &[Slot], parent: DashaEntity) -> Result<Vec<Slot>, DashaError> {
    let start = sequence
        .iter()
        .position(|s| s.entity == parent)
        .ok_or(DashaError::InvalidInput("parent entity is not in the system sequence"))?;
    Ok(sequence[start..]
        .iter()
        .chain(&sequence[..start])
        .copied()
        .collect())
}

/// Rules for one of the four supported systems, resolved for a birth.
#[derive(Debug, Clone)]
pub enum SystemRules {
    Vimshottari(NakshatraDashaRules),
    Yogini(YoginiRules),
    Ashtottari(NakshatraDashaRules),
    Kalachakra(KalachakraRules),
}

impl SystemRules {
    /// Select the rules for `system`.
    ///
    /// `nakshatra_name` overrides the nakshatra derived from the longitude
    /// for the Kalachakra group lookup; the other systems ignore it.
    pub fn resolve(
        system: DashaSystem,
        position: &NakshatraPosition,
        nakshatra_name: Option<&str>,
    ) -> Result<Self, Inapplicable> {
        Ok(match system {
            DashaSystem::Vimshottari => Self::Vimshottari(vimshottari_rules()),
            DashaSystem::Yogini => Self::Yogini(YoginiRules::new()),
            DashaSystem::Ashtottari => Self::Ashtottari(ashtottari_rules()),
            DashaSystem::Kalachakra => {
                let name = nakshatra_name.unwrap_or(position.nakshatra.name());
                Self::Kalachakra(KalachakraRules::for_birth(name, position.pada)?)
            }
        })
    }

    /// Group/pada details when these are Kalachakra rules.
    pub fn kalachakra_meta(&self) -> Option<KalachakraMeta> {
        match self {
            Self::Kalachakra(k) => Some(k.meta()),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn PeriodSystem {
        match self {
            Self::Vimshottari(r) | Self::Ashtottari(r) => r as &dyn PeriodSystem,
            Self::Yogini(r) => r as &dyn PeriodSystem,
            Self::Kalachakra(r) => r as &dyn PeriodSystem,
        }
    }
}

impl PeriodSystem for SystemRules {
    fn system(&self) -> DashaSystem {
        self.inner().system()
    }

    fn top_level_sequence(&self) -> &[Slot] {
        self.inner().top_level_sequence()
    }

    fn starting_state(&self, position: &NakshatraPosition) -> Result<StartingState, Inapplicable> {
        self.inner().starting_state(position)
    }

    fn child_sequence(&self, parent: DashaEntity) -> Result<Vec<Slot>, DashaError> {
        self.inner().child_sequence(parent)
    }
}
