//! Kalachakra dasha rules.
//!
//! The birth nakshatra's group and the birth pada select a 9-sign
//! progression. Mahadashas cycle through that progression with each sign's
//! own year count; sub-periods follow a path walk bounded by the Deha and
//! Jeeva marker signs.

use serde::{Deserialize, Serialize};

use crate::error::DashaError;
use crate::nakshatra::{Nakshatra, NakshatraPosition};
use crate::rashi::Rashi;

use super::kalachakra_data::{KalachakraGroup, KalachakraRow, kalachakra_row, sign_years};
use super::system::{Inapplicable, PeriodSystem, Slot, StartingState};
use super::types::{DashaEntity, DashaSystem};

/// Number of sub-periods in every Kalachakra subdivision.
pub const KALACHAKRA_CHILD_COUNT: usize = 8;

/// Group and progression details reported alongside a Kalachakra timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KalachakraMeta {
    pub nakshatra: String,
    pub pada: u8,
    pub group: String,
    pub direction: String,
    pub paramayu: f64,
    pub deha: String,
    pub jeeva: String,
    pub sequence: Vec<String>,
}

/// Kalachakra rules resolved for one nakshatra and pada.
#[derive(Debug, Clone)]
pub struct KalachakraRules {
    nakshatra: Nakshatra,
    group: KalachakraGroup,
    pada: u8,
    row: KalachakraRow,
    sequence: Vec<Slot>,
}

impl KalachakraRules {
    /// Resolve the progression for a nakshatra name and pada (1..=4).
    pub fn for_birth(nakshatra_name: &str, pada: u8) -> Result<Self, Inapplicable> {
        let nakshatra =
            Nakshatra::from_name(nakshatra_name).ok_or_else(|| Inapplicable::UnsupportedMapping {
                input: nakshatra_name.to_string(),
            })?;
        let group = KalachakraGroup::of(nakshatra);
        let row = kalachakra_row(group, pada).ok_or_else(|| Inapplicable::UnsupportedMapping {
            input: format!("{} pada {pada}", nakshatra.name()),
        })?;
        Ok(Self::from_row(nakshatra, group, pada, *row))
    }

    /// Rules over an explicit row. Rows are not validated here; a marker
    /// missing from the sequence surfaces from `child_sequence`.
    pub fn from_row(nakshatra: Nakshatra, group: KalachakraGroup, pada: u8, row: KalachakraRow) -> Self {
        let sequence = row
            .sequence
            .iter()
            .map(|&r| Slot::new(DashaEntity::Rashi(r), sign_years(r)))
            .collect();
        Self {
            nakshatra,
            group,
            pada,
            row,
            sequence,
        }
    }

    pub fn group(&self) -> KalachakraGroup {
        self.group
    }

    pub fn row(&self) -> &KalachakraRow {
        &self.row
    }

    /// `(end, restart)` markers of the path walk: Jeeva then Deha for
    /// Savya groups, Deha then Jeeva for Apsavya groups.
    pub fn end_and_restart(&self) -> ((Rashi, &'static str), (Rashi, &'static str)) {
        let deha = (self.row.deha, "Deha");
        let jeeva = (self.row.jeeva, "Jeeva");
        if self.group.is_savya() {
            (jeeva, deha)
        } else {
            (deha, jeeva)
        }
    }

    /// Birth mahadasha for a pada fraction.
    ///
    /// Elapsed years are `paramayu * pada_fraction`; whole signs are
    /// consumed from the front of the progression until the remainder is
    /// smaller than the current sign's years.
    pub fn birth_balance(&self, pada_fraction: f64) -> StartingState {
        let n = self.sequence.len();
        let mut remainder = self.row.paramayu * pada_fraction.clamp(0.0, 1.0);
        let mut idx = 0;
        for _ in 0..n {
            let w = self.sequence[idx].weight_years;
            if remainder < w {
                break;
            }
            remainder -= w;
            idx += 1;
        }
        let idx = idx % n;
        let weight = self.sequence[idx].weight_years;
        StartingState {
            start_index: idx,
            elapsed_fraction: (remainder / weight).clamp(0.0, 1.0),
            first_slot_weight: weight,
        }
    }

    fn position_of(&self, sign: Rashi) -> Option<usize> {
        self.row.sequence.iter().position(|&s| s == sign)
    }

    /// Ordered child signs of a period ruled by `parent`.
    ///
    /// Walks forward from the parent's sign through the end marker, then
    /// continues from the restart marker until 8 signs are collected.
    /// Repeated signs resolve to their first occurrence.
    pub fn child_signs(&self, parent: Rashi) -> Result<Vec<Rashi>, DashaError> {
        let ((end, end_role), (restart, restart_role)) = self.end_and_restart();
        let defect = |sign: Rashi, role: &'static str| DashaError::KalachakraTable {
            sign: sign.western_name(),
            role,
        };
        let end_idx = self.position_of(end).ok_or(defect(end, end_role))?;
        let restart_idx = self.position_of(restart).ok_or(defect(restart, restart_role))?;
        let start_idx = self
            .position_of(parent)
            .ok_or(DashaError::InvalidInput("parent sign is not in the progression"))?;

        let seq = &self.row.sequence;
        let n = seq.len();
        let mut out = Vec::with_capacity(KALACHAKRA_CHILD_COUNT);
        for step in 0..n {
            let i = (start_idx + step) % n;
            if out.len() < KALACHAKRA_CHILD_COUNT {
                out.push(seq[i]);
            }
            if i == end_idx {
                break;
            }
        }
        for step in 0..n {
            if out.len() == KALACHAKRA_CHILD_COUNT {
                break;
            }
            out.push(seq[(restart_idx + step) % n]);
        }
        Ok(out)
    }

    pub fn meta(&self) -> KalachakraMeta {
        KalachakraMeta {
            nakshatra: self.nakshatra.name().to_string(),
            pada: self.pada,
            group: self.group.key().to_string(),
            direction: if self.group.is_savya() { "Savya" } else { "Apsavya" }.to_string(),
            paramayu: self.row.paramayu,
            deha: self.row.deha.western_name().to_string(),
            jeeva: self.row.jeeva.western_name().to_string(),
            sequence: self
                .row
                .sequence
                .iter()
                .map(|r| r.western_name().to_string())
                .collect(),
        }
    }
}

impl PeriodSystem for KalachakraRules {
    fn system(&self) -> DashaSystem {
        DashaSystem::Kalachakra
    }

    fn top_level_sequence(&self) -> &[Slot] {
        &self.sequence
    }

    fn starting_state(&self, position: &NakshatraPosition) -> Result<StartingState, Inapplicable> {
        Ok(self.birth_balance(position.pada_fraction))
    }

    fn child_sequence(&self, parent: DashaEntity) -> Result<Vec<Slot>, DashaError> {
        let DashaEntity::Rashi(sign) = parent else {
            return Err(DashaError::InvalidInput("kalachakra periods are ruled by signs"));
        };
        Ok(self
            .child_signs(sign)?
            .into_iter()
            .map(|r| Slot::new(DashaEntity::Rashi(r), sign_years(r)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Rashi::*;

    #[test]
    fn ashwini_pada_1_full_aries() {
        let k = KalachakraRules::for_birth("Ashwini", 1).unwrap();
        assert_eq!(k.group(), KalachakraGroup::Savya1);
        let s = k.birth_balance(0.0);
        assert_eq!(s.start_index, 0);
        assert!((s.balance_years() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn balance_walk_skips_consumed_signs() {
        // 10 of 100 years elapsed: Aries (7) consumed, 3 into Taurus (16)
        let k = KalachakraRules::for_birth("Ashwini", 1).unwrap();
        let s = k.birth_balance(0.1);
        assert_eq!(s.start_index, 1);
        assert!((s.balance_years() - 13.0).abs() < 1e-9);
    }

    #[test]
    fn savya_walk_wraps_to_deha() {
        // S1 pada 1: Aries..Sagittarius, Jeeva = Sagittarius, Deha = Aries
        let k = KalachakraRules::for_birth("Ashwini", 1).unwrap();
        let kids = k.child_signs(Simha).unwrap();
        assert_eq!(kids, vec![Simha, Kanya, Tula, Vrischika, Dhanu, Mesha, Vrishabha, Mithuna]);
    }

    #[test]
    fn walk_from_first_sign_stops_at_eight() {
        let k = KalachakraRules::for_birth("Ashwini", 1).unwrap();
        let kids = k.child_signs(Mesha).unwrap();
        assert_eq!(kids.len(), KALACHAKRA_CHILD_COUNT);
        assert_eq!(kids[7], Vrischika);
    }

    #[test]
    fn apsavya_walk_ends_at_deha() {
        // A1 pada 1: Sag Cap Aqu Pis Ari Tau Gem Leo Can, Deha = Cancer, Jeeva = Sagittarius
        let k = KalachakraRules::for_birth("Rohini", 1).unwrap();
        assert!(!k.group().is_savya());
        let kids = k.child_signs(Meena).unwrap();
        assert_eq!(kids, vec![Meena, Mesha, Vrishabha, Mithuna, Simha, Karka, Dhanu, Makara]);
    }

    #[test]
    fn repeated_sign_uses_first_occurrence() {
        // S1 pada 3: Tau Ari Pis Aqu Cap Sag Ari Tau Gem
        let k = KalachakraRules::for_birth("Hasta", 3).unwrap();
        let kids = k.child_signs(Mesha).unwrap();
        assert_eq!(kids, vec![Mesha, Meena, Kumbha, Makara, Dhanu, Mesha, Vrishabha, Mithuna]);
    }

    #[test]
    fn missing_marker_fails_fast() {
        // Deha Taurus does not occur in this progression
        let defective = KalachakraRow {
            sequence: [Makara, Kumbha, Meena, Vrischika, Tula, Kanya, Karka, Simha, Mithuna],
            paramayu: 85.0,
            deha: Vrishabha,
            jeeva: Karka,
        };
        let k = KalachakraRules::from_row(Nakshatra::Ashwini, KalachakraGroup::Savya1, 2, defective);
        let err = k.child_signs(Makara).unwrap_err();
        assert_eq!(
            err,
            DashaError::KalachakraTable {
                sign: "Taurus",
                role: "Deha"
            }
        );
    }

    #[test]
    fn alias_resolves_group() {
        let k = KalachakraRules::for_birth("Shatataraka", 2).unwrap();
        assert_eq!(k.group(), KalachakraGroup::Apsavya3);
        assert_eq!(k.meta().nakshatra, "Shatabhisha");
    }

    #[test]
    fn unknown_name_is_unsupported() {
        let err = KalachakraRules::for_birth("Abhijit", 1).unwrap_err();
        assert!(matches!(err, Inapplicable::UnsupportedMapping { input } if input == "Abhijit"));
    }

    #[test]
    fn non_sign_parent_rejected() {
        let k = KalachakraRules::for_birth("Ashwini", 1).unwrap();
        assert!(k.child_sequence(DashaEntity::Yogini(0)).is_err());
    }
}
