//! Nakshatra-lord systems: Vimshottari (120 years) and Ashtottari (108 years).
//!
//! Both start from the Vimshottari lord of the birth nakshatra and truncate
//! the first mahadasha by the fraction of that nakshatra the Moon has
//! already crossed. Ashtottari only applies when that lord is one of its
//! four permitted starting lords.

use crate::graha::Graha;
use crate::nakshatra::{Nakshatra, NakshatraPosition};
use crate::error::DashaError;

use super::system::{Inapplicable, PeriodSystem, Slot, StartingState, rotate_from};
use super::types::{DashaEntity, DashaSystem};

/// Vimshottari lords and years, in sequence. Nakshatra index mod 9 selects
/// the lord (Ashwini → Ketu, Bharani → Shukra, ...).
pub const VIMSHOTTARI_SEQUENCE: [(Graha, f64); 9] = [
    (Graha::Ketu, 7.0),
    (Graha::Shukra, 20.0),
    (Graha::Surya, 6.0),
    (Graha::Chandra, 10.0),
    (Graha::Mangal, 7.0),
    (Graha::Rahu, 18.0),
    (Graha::Guru, 16.0),
    (Graha::Shani, 19.0),
    (Graha::Buddh, 17.0),
];

/// Ashtottari lords and years, in sequence.
pub const ASHTOTTARI_SEQUENCE: [(Graha, f64); 8] = [
    (Graha::Surya, 6.0),
    (Graha::Chandra, 15.0),
    (Graha::Mangal, 8.0),
    (Graha::Buddh, 17.0),
    (Graha::Shani, 10.0),
    (Graha::Guru, 19.0),
    (Graha::Rahu, 12.0),
    (Graha::Shukra, 21.0),
];

/// Nakshatra lords for which Ashtottari applies.
pub const ASHTOTTARI_START_LORDS: [Graha; 4] =
    [Graha::Surya, Graha::Chandra, Graha::Mangal, Graha::Guru];

/// Vimshottari lord of a nakshatra.
pub fn nakshatra_lord(nakshatra: Nakshatra) -> Graha {
    VIMSHOTTARI_SEQUENCE[nakshatra.index() as usize % 9].0
}

/// Rules for a system whose mahadasha lords follow the nakshatra lord.
#[derive(Debug, Clone)]
pub struct NakshatraDashaRules {
    system: DashaSystem,
    sequence: Vec<Slot>,
    /// `None` means every nakshatra lord may start the sequence.
    allowed_start_lords: Option<&'static [Graha]>,
}

impl NakshatraDashaRules {
    fn from_table(
        system: DashaSystem,
        table: &[(Graha, f64)],
        allowed_start_lords: Option<&'static [Graha]>,
    ) -> Self {
        Self {
            system,
            sequence: table
                .iter()
                .map(|&(g, years)| Slot::new(DashaEntity::Graha(g), years))
                .collect(),
            allowed_start_lords,
        }
    }
}

/// Vimshottari rules.
pub fn vimshottari_rules() -> NakshatraDashaRules {
    NakshatraDashaRules::from_table(DashaSystem::Vimshottari, &VIMSHOTTARI_SEQUENCE, None)
}

/// Ashtottari rules.
pub fn ashtottari_rules() -> NakshatraDashaRules {
    NakshatraDashaRules::from_table(
        DashaSystem::Ashtottari,
        &ASHTOTTARI_SEQUENCE,
        Some(&ASHTOTTARI_START_LORDS),
    )
}

impl PeriodSystem for NakshatraDashaRules {
    fn system(&self) -> DashaSystem {
        self.system
    }

    fn top_level_sequence(&self) -> &[Slot] {
        &self.sequence
    }

    fn starting_state(&self, position: &NakshatraPosition) -> Result<StartingState, Inapplicable> {
        let lord = nakshatra_lord(position.nakshatra);
        let not_applicable = || Inapplicable::NotApplicable {
            reason: format!(
                "{} requires a Sun, Moon, Mars or Jupiter nakshatra; {} is ruled by {}",
                self.system.name(),
                position.nakshatra.name(),
                lord.english_name()
            ),
        };
        if let Some(allowed) = self.allowed_start_lords {
            if !allowed.contains(&lord) {
                return Err(not_applicable());
            }
        }
        let start_index = self
            .sequence
            .iter()
            .position(|s| s.entity == DashaEntity::Graha(lord))
            .ok_or_else(not_applicable)?;
        Ok(StartingState {
            start_index,
            elapsed_fraction: position.nakshatra_fraction,
            first_slot_weight: self.sequence[start_index].weight_years,
        })
    }

    fn child_sequence(&self, parent: DashaEntity) -> Result<Vec<Slot>, DashaError> {
        rotate_from(&self.sequence, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nakshatra::NAKSHATRA_SPAN_27;

    fn at(lon: f64) -> NakshatraPosition {
        NakshatraPosition::from_longitude(lon).unwrap()
    }

    #[test]
    fn vimshottari_total_120() {
        assert!((vimshottari_rules().total_cycle_weight() - 120.0).abs() < 1e-12);
    }

    #[test]
    fn ashtottari_total_108() {
        assert!((ashtottari_rules().total_cycle_weight() - 108.0).abs() < 1e-12);
    }

    #[test]
    fn each_lord_rules_three_nakshatras() {
        for (g, _) in VIMSHOTTARI_SEQUENCE {
            let count = crate::nakshatra::ALL_NAKSHATRAS_27
                .iter()
                .filter(|&&n| nakshatra_lord(n) == g)
                .count();
            assert_eq!(count, 3, "{}", g.english_name());
        }
    }

    #[test]
    fn vimshottari_ashwini_start() {
        let s = vimshottari_rules().starting_state(&at(0.0)).unwrap();
        assert_eq!(s.start_index, 0);
        assert!(s.elapsed_fraction.abs() < 1e-12);
        assert!((s.balance_years() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn vimshottari_mid_rohini_half_balance() {
        let s = vimshottari_rules()
            .starting_state(&at(40.0 + NAKSHATRA_SPAN_27 / 2.0))
            .unwrap();
        assert_eq!(s.start_index, 3);
        assert!((s.balance_years() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn ashtottari_rejects_venus_nakshatra() {
        // Bharani is ruled by Shukra
        let r = ashtottari_rules().starting_state(&at(NAKSHATRA_SPAN_27 + 1.0));
        assert!(matches!(r, Err(Inapplicable::NotApplicable { .. })));
    }

    #[test]
    fn ashtottari_starts_at_nakshatra_lord() {
        // Rohini is ruled by Chandra
        let s = ashtottari_rules().starting_state(&at(40.0)).unwrap();
        assert_eq!(s.start_index, 1);
        assert!((s.first_slot_weight - 15.0).abs() < 1e-12);
    }

    #[test]
    fn children_restart_at_parent() {
        let rules = vimshottari_rules();
        let kids = rules
            .child_sequence(DashaEntity::Graha(Graha::Rahu))
            .unwrap();
        assert_eq!(kids.len(), 9);
        assert_eq!(kids[0].entity, DashaEntity::Graha(Graha::Rahu));
        assert_eq!(kids[8].entity, DashaEntity::Graha(Graha::Mangal));
    }
}
