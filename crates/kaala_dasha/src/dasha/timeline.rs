//! Timeline construction: birth inputs → immutable period tree.
//!
//! Computation tiers:
//! - Tier 0: Level-0 (mahadasha) generation up to the horizon
//! - Tier 1: All children of one parent
//! - Tier 2: Complete level from parent level
//! - Tier 3: Tree of levels 0..=eager depth, built iteratively

use std::ops::Range;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DashaError;
use crate::nakshatra::NakshatraPosition;
use crate::util::{checked_shift, local_to_utc, years_to_delta};

use super::subperiod::proportional_children;
use super::system::{Inapplicable, PeriodSystem, StartingState, SystemRules};
use super::types::{
    DEFAULT_DASHA_LEVEL, DEFAULT_HORIZON_YEARS, DashaLevel, DashaPeriod, DashaSystem,
    MAX_DASHA_LEVEL, MAX_EAGER_DASHA_LEVEL, MAX_PERIODS_PER_LEVEL,
};

/// Build parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Years past birth the top-level sequence must cover.
    pub horizon_years: f64,
    /// Deepest level reported (0 = mahadashas only). Builders stop at
    /// [`MAX_EAGER_DASHA_LEVEL`]; the locator fills in anything deeper.
    pub depth: u8,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            depth: DEFAULT_DASHA_LEVEL,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.horizon_years.is_finite() || self.horizon_years <= 0.0 {
            return Err("horizon_years must be positive and finite");
        }
        if self.depth > MAX_DASHA_LEVEL {
            return Err("depth must be at most 4");
        }
        Ok(())
    }

    /// Levels a builder materializes in full.
    pub fn eager_depth(&self) -> u8 {
        self.depth.min(MAX_EAGER_DASHA_LEVEL)
    }
}

/// Birth data a timeline is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct BirthInputs {
    pub birth: DateTime<Utc>,
    /// Sidereal ecliptic longitude of the Moon at birth, degrees.
    pub moon_longitude: f64,
    /// Birth nakshatra as named by an upstream source. Overrides the
    /// longitude-derived nakshatra for the Kalachakra group lookup.
    pub nakshatra_name: Option<String>,
}

impl BirthInputs {
    pub fn new(birth: DateTime<Utc>, moon_longitude: f64) -> Self {
        Self {
            birth,
            moon_longitude,
            nakshatra_name: None,
        }
    }

    /// Birth given as local civil time plus a UTC offset in hours.
    pub fn from_local(
        local: NaiveDateTime,
        tz_offset_hours: f64,
        moon_longitude: f64,
    ) -> Result<Self, DashaError> {
        Ok(Self::new(local_to_utc(local, tz_offset_hours)?, moon_longitude))
    }

    pub fn with_nakshatra_name(mut self, name: impl Into<String>) -> Self {
        self.nakshatra_name = Some(name.into());
        self
    }
}

/// A built timeline. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct PeriodTree {
    birth: DateTime<Utc>,
    position: NakshatraPosition,
    rules: SystemRules,
    starting_state: StartingState,
    levels: Vec<Vec<DashaPeriod>>,
}

impl PeriodTree {
    pub fn system(&self) -> DashaSystem {
        self.rules.system()
    }

    pub fn birth(&self) -> DateTime<Utc> {
        self.birth
    }

    pub fn position(&self) -> &NakshatraPosition {
        &self.position
    }

    pub fn rules(&self) -> &SystemRules {
        &self.rules
    }

    pub fn starting_state(&self) -> &StartingState {
        &self.starting_state
    }

    /// Deepest level built eagerly.
    pub fn depth(&self) -> u8 {
        (self.levels.len() - 1) as u8
    }

    /// Levels: levels[0]=mahadasha, levels[1]=antardasha, etc.
    pub fn levels(&self) -> &[Vec<DashaPeriod>] {
        &self.levels
    }

    pub fn mahadashas(&self) -> &[DashaPeriod] {
        &self.levels[0]
    }

    /// End of the last mahadasha.
    pub fn horizon_end(&self) -> DateTime<Utc> {
        self.levels[0].last().map_or(self.birth, |p| p.end)
    }

    /// Range within `levels[level + 1]` holding the children of
    /// `levels[level][idx]`; empty beyond the built depth.
    pub fn child_range(&self, level: u8, idx: usize) -> Range<usize> {
        let Some(kids) = self.levels.get(level as usize + 1) else {
            return 0..0;
        };
        let lo = kids.partition_point(|p| (p.parent_idx as usize) < idx);
        let hi = kids.partition_point(|p| (p.parent_idx as usize) <= idx);
        lo..hi
    }

    /// Stored children of `levels[level][idx]`; empty beyond the built depth.
    pub fn children_of(&self, level: u8, idx: usize) -> &[DashaPeriod] {
        match self.levels.get(level as usize + 1) {
            Some(kids) => &kids[self.child_range(level, idx)],
            None => &[],
        }
    }
}

/// Result of a build: a tree, or a structured reason there is none.
#[derive(Debug, Clone)]
pub enum TimelineOutcome {
    Built(PeriodTree),
    NotApplicable { system: DashaSystem, reason: String },
    UnsupportedMapping { system: DashaSystem, input: String },
}

impl TimelineOutcome {
    fn inapplicable(system: DashaSystem, why: Inapplicable) -> Self {
        match why {
            Inapplicable::NotApplicable { reason } => Self::NotApplicable { system, reason },
            Inapplicable::UnsupportedMapping { input } => Self::UnsupportedMapping { system, input },
        }
    }

    pub fn tree(&self) -> Option<&PeriodTree> {
        match self {
            Self::Built(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_tree(self) -> Option<PeriodTree> {
        match self {
            Self::Built(t) => Some(t),
            _ => None,
        }
    }
}

// ── Tier 0: Level-0 (Mahadasha) generation ───────────────────────────

/// Generate level-0 periods from `birth` until `horizon_years` are covered.
pub fn level0(
    rules: &impl PeriodSystem,
    start: &StartingState,
    birth: DateTime<Utc>,
    horizon_years: f64,
) -> Result<Vec<DashaPeriod>, DashaError> {
    let seq = rules.top_level_sequence();
    let n = seq.len();
    if n == 0 {
        return Err(DashaError::InvalidInput("empty top-level sequence"));
    }
    let horizon_end = checked_shift(birth, years_to_delta(horizon_years)?)?;

    let mut periods = Vec::with_capacity(n * 2);
    let mut cursor = birth;
    let mut offset = 0usize;
    while cursor < horizon_end {
        if periods.len() >= MAX_PERIODS_PER_LEVEL {
            return Err(DashaError::TooManyPeriods {
                level: DashaLevel::Mahadasha.name(),
                count: periods.len() + 1,
                limit: MAX_PERIODS_PER_LEVEL,
            });
        }
        let slot = seq[(start.start_index + offset) % n];
        let years = if offset == 0 {
            start.balance_years()
        } else {
            slot.weight_years
        };
        if !years.is_finite() || years < 0.0 {
            return Err(DashaError::InvalidInput("period length must be finite and non-negative"));
        }
        let end = checked_shift(cursor, years_to_delta(years)?)?;
        periods.push(DashaPeriod {
            entity: slot.entity,
            start: cursor,
            end,
            level: DashaLevel::Mahadasha,
            order: u16::try_from(offset + 1).unwrap_or(u16::MAX),
            parent_idx: 0,
        });
        cursor = end;
        offset += 1;
    }

    Ok(periods)
}

// ── Tier 1: All children of one parent ───────────────────────────────

/// Calculate all child periods for a single parent period.
pub fn children(
    rules: &impl PeriodSystem,
    parent: &DashaPeriod,
    parent_idx: u32,
) -> Result<Vec<DashaPeriod>, DashaError> {
    let Some(child_level) = parent.level.child_level() else {
        return Ok(Vec::new());
    };
    let seq = rules.child_sequence(parent.entity)?;
    proportional_children(parent, &seq, child_level, parent_idx)
}

// ── Tier 2: Complete level from parent level ─────────────────────────

/// Calculate complete level N given all periods at level N-1.
pub fn complete_level(
    rules: &impl PeriodSystem,
    parent_level: &[DashaPeriod],
    child_level: DashaLevel,
) -> Result<Vec<DashaPeriod>, DashaError> {
    let per_parent = match parent_level.first() {
        Some(p) => rules.child_sequence(p.entity)?.len(),
        None => return Ok(Vec::new()),
    };
    let estimated = parent_level.len() * per_parent;
    if estimated > MAX_PERIODS_PER_LEVEL {
        return Err(DashaError::TooManyPeriods {
            level: child_level.name(),
            count: estimated,
            limit: MAX_PERIODS_PER_LEVEL,
        });
    }

    let mut result = Vec::with_capacity(estimated);
    for (pidx, parent) in parent_level.iter().enumerate() {
        let seq = rules.child_sequence(parent.entity)?;
        result.extend(proportional_children(parent, &seq, child_level, pidx as u32)?);
    }
    Ok(result)
}

// ── Tier 3: Full tree ────────────────────────────────────────────────

/// Builds period trees for one system.
#[derive(Debug, Clone, Copy)]
pub struct TimelineBuilder {
    system: DashaSystem,
    config: TimelineConfig,
}

impl TimelineBuilder {
    pub fn new(system: DashaSystem, config: TimelineConfig) -> Self {
        Self { system, config }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Resolve the system's rules for `birth` and build its tree.
    pub fn build(&self, birth: &BirthInputs) -> Result<TimelineOutcome, DashaError> {
        self.config.validate().map_err(DashaError::InvalidInput)?;
        let position = NakshatraPosition::from_longitude(birth.moon_longitude)?;
        match SystemRules::resolve(self.system, &position, birth.nakshatra_name.as_deref()) {
            Ok(rules) => self.build_with_rules(rules, birth.birth, position),
            Err(why) => {
                warn!(system = self.system.name(), ?why, "dasha system has no timeline for this birth");
                Ok(TimelineOutcome::inapplicable(self.system, why))
            }
        }
    }

    /// Build a tree from already-resolved rules.
    pub fn build_with_rules(
        &self,
        rules: SystemRules,
        birth: DateTime<Utc>,
        position: NakshatraPosition,
    ) -> Result<TimelineOutcome, DashaError> {
        self.config.validate().map_err(DashaError::InvalidInput)?;
        let system = rules.system();
        let starting_state = match rules.starting_state(&position) {
            Ok(s) => s,
            Err(why) => {
                warn!(system = system.name(), ?why, "dasha system has no timeline for this birth");
                return Ok(TimelineOutcome::inapplicable(system, why));
            }
        };

        let mut levels = vec![level0(&rules, &starting_state, birth, self.config.horizon_years)?];
        let eager = self.config.eager_depth();
        for depth in 1..=eager {
            let Some(child_level) = DashaLevel::from_u8(depth) else {
                break;
            };
            let next = complete_level(&rules, &levels[(depth - 1) as usize], child_level)?;
            levels.push(next);
        }

        debug!(
            system = system.name(),
            mahadashas = levels[0].len(),
            depth = eager,
            start_index = starting_state.start_index,
            elapsed_fraction = starting_state.elapsed_fraction,
            "built dasha timeline"
        );

        Ok(TimelineOutcome::Built(PeriodTree {
            birth,
            position,
            rules,
            starting_state,
            levels,
        }))
    }
}
