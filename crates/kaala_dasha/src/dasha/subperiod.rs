//! Proportional subdivision of one period into its children.
//!
//! Child duration = parent's actual duration * weight / sum(child weights),
//! so children of a truncated birth period still tile it exactly. Time is
//! apportioned in whole microseconds and the last child absorbs rounding.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::DashaError;

use super::system::Slot;
use super::types::{DashaLevel, DashaPeriod};

/// Snap the last child's end to the parent's end to absorb rounding drift.
pub fn snap_last_child_end(children: &mut [DashaPeriod], parent_end: DateTime<Utc>) {
    if let Some(last) = children.last_mut() {
        last.end = parent_end;
    }
}

/// Generate proportional children for a parent period.
///
/// `sequence`: ordered child entities with their weights.
/// `child_level`: the level to assign to generated children.
/// `parent_idx`: index of parent in its level array.
pub fn proportional_children(
    parent: &DashaPeriod,
    sequence: &[Slot],
    child_level: DashaLevel,
    parent_idx: u32,
) -> Result<Vec<DashaPeriod>, DashaError> {
    let total_weight: f64 = sequence.iter().map(|s| s.weight_years).sum();
    if sequence.is_empty() || total_weight.is_nan() || total_weight <= 0.0 {
        return Err(DashaError::InvalidInput("child sequence has no positive weight"));
    }
    let parent_us = parent
        .duration()
        .num_microseconds()
        .ok_or(DashaError::InvalidInput("parent period too long to subdivide"))?;

    let mut children = Vec::with_capacity(sequence.len());
    let mut cursor = parent.start;
    for (order_0, slot) in sequence.iter().enumerate() {
        let share = (parent_us as f64 * (slot.weight_years / total_weight)).round() as i64;
        let end = (cursor + TimeDelta::microseconds(share)).min(parent.end);
        children.push(DashaPeriod {
            entity: slot.entity,
            start: cursor,
            end,
            level: child_level,
            order: (order_0 as u16) + 1,
            parent_idx,
        });
        cursor = end;
    }

    snap_last_child_end(&mut children, parent.end);
    Ok(children)
}
