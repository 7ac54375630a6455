//! Yogini dasha rules.
//!
//! The pada of the birth Moon picks the starting yogini, and the fraction
//! of that pada already crossed truncates the first mahadasha.

use crate::error::DashaError;
use crate::nakshatra::NakshatraPosition;

use super::system::{Inapplicable, PeriodSystem, Slot, StartingState, rotate_from};
use super::types::{DashaEntity, DashaSystem};
use super::yogini_data::{YOGINI_START_FROM_PADA, YOGINI_YEARS};

#[derive(Debug, Clone)]
pub struct YoginiRules {
    sequence: Vec<Slot>,
}

impl YoginiRules {
    pub fn new() -> Self {
        Self {
            sequence: YOGINI_YEARS
                .iter()
                .enumerate()
                .map(|(i, &years)| Slot::new(DashaEntity::Yogini(i as u8), years))
                .collect(),
        }
    }
}

impl Default for YoginiRules {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodSystem for YoginiRules {
    fn system(&self) -> DashaSystem {
        DashaSystem::Yogini
    }

    fn top_level_sequence(&self) -> &[Slot] {
        &self.sequence
    }

    fn starting_state(&self, position: &NakshatraPosition) -> Result<StartingState, Inapplicable> {
        let pada_idx = (position.pada.clamp(1, 4) - 1) as usize;
        let start_index = YOGINI_START_FROM_PADA[pada_idx];
        Ok(StartingState {
            start_index,
            elapsed_fraction: position.pada_fraction,
            first_slot_weight: self.sequence[start_index].weight_years,
        })
    }

    fn child_sequence(&self, parent: DashaEntity) -> Result<Vec<Slot>, DashaError> {
        rotate_from(&self.sequence, parent)
    }
}
