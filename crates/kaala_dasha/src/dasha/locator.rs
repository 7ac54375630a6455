//! Active-period lookup over a built tree.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::DashaError;

use super::timeline::{PeriodTree, children};
use super::types::{DashaPeriod, DashaSnapshot, MAX_DASHA_LEVEL};

/// Find the index of the period containing `instant`.
///
/// Periods must be sorted and contiguous. Returns `None` if `instant` is
/// before the first start or at/after the last end.
pub fn find_active_period(periods: &[DashaPeriod], instant: DateTime<Utc>) -> Option<usize> {
    let idx = periods.partition_point(|p| p.end <= instant);
    periods
        .get(idx)
        .filter(|p| p.start <= instant)
        .map(|_| idx)
}

/// Containing period, or the nearest end of the range when `instant`
/// falls outside it. The flag is false when clamped.
fn locate_or_clamp(periods: &[DashaPeriod], instant: DateTime<Utc>) -> Option<(usize, bool)> {
    if periods.is_empty() {
        return None;
    }
    match find_active_period(periods, instant) {
        Some(idx) => Some((idx, true)),
        None if instant < periods[0].start => Some((0, false)),
        None => Some((periods.len() - 1, false)),
    }
}

/// Queries one tree for the periods active at arbitrary instants.
#[derive(Debug, Clone, Copy)]
pub struct ActivePeriodLocator<'a> {
    tree: &'a PeriodTree,
}

impl<'a> ActivePeriodLocator<'a> {
    pub fn new(tree: &'a PeriodTree) -> Self {
        Self { tree }
    }

    /// Immediate children of any period of the tree, computed from its rules.
    pub fn children_of(&self, period: &DashaPeriod) -> Result<Vec<DashaPeriod>, DashaError> {
        children(self.tree.rules(), period, 0)
    }

    /// Active period at each level `0..=depth` for `instant`.
    ///
    /// Outside the built horizon the first or last mahadasha stands in and
    /// `within_horizon` is false.
    pub fn snapshot(&self, instant: DateTime<Utc>, depth: u8) -> Result<DashaSnapshot, DashaError> {
        let depth = depth.min(MAX_DASHA_LEVEL);
        let mut periods = Vec::with_capacity(depth as usize + 1);

        let level0 = self.tree.mahadashas();
        let Some((mut idx, mut within)) = locate_or_clamp(level0, instant) else {
            return Err(DashaError::InvalidInput("tree has no mahadashas"));
        };
        if !within {
            warn!(
                system = self.tree.system().name(),
                %instant,
                "query instant outside the built horizon; clamping"
            );
        }
        let mut current = level0[idx];
        periods.push(current);

        for level in 1..=depth {
            let materialized;
            let (kids, base): (&[DashaPeriod], Option<usize>) = if level <= self.tree.depth() {
                let range = self.tree.child_range(level - 1, idx);
                let start = range.start;
                (&self.tree.levels()[level as usize][range], Some(start))
            } else {
                materialized = children(self.tree.rules(), &current, idx as u32)?;
                (&materialized, None)
            };
            let Some((kid_idx, kid_within)) = locate_or_clamp(kids, instant) else {
                break;
            };
            within &= kid_within;
            current = kids[kid_idx];
            periods.push(current);
            idx = base.map_or(kid_idx, |b| b + kid_idx);
        }

        Ok(DashaSnapshot {
            system: self.tree.system(),
            query: instant,
            within_horizon: within,
            periods,
        })
    }
}
