//! Serializable output: period records grouped by system name, with the
//! active chain at a query instant.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DashaError;

use super::kalachakra::KalachakraMeta;
use super::locator::ActivePeriodLocator;
use super::timeline::{BirthInputs, PeriodTree, TimelineBuilder, TimelineConfig, TimelineOutcome};
use super::types::{DashaPeriod, DashaSystem};

/// One period as emitted to callers. Instants serialize as ISO-8601 UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lord: Option<String>,
    pub level: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<&DashaPeriod> for PeriodRecord {
    fn from(p: &DashaPeriod) -> Self {
        Self {
            label: p.label().to_string(),
            lord: p.entity.lord().map(|g| g.english_name().to_string()),
            level: p.level.name().to_string(),
            start: p.start,
            end: p.end,
        }
    }
}

fn records(periods: &[DashaPeriod]) -> Vec<PeriodRecord> {
    periods.iter().map(PeriodRecord::from).collect()
}

/// Mahadashas plus the subdivisions around the active chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemTimeline {
    pub mahadashas: Vec<PeriodRecord>,
    pub current_antardashas: Vec<PeriodRecord>,
    pub current_pratyantardashas: Vec<PeriodRecord>,
}

/// Report for one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SystemReport {
    Computed {
        /// Active period per level, mahadasha first.
        active: Vec<PeriodRecord>,
        within_horizon: bool,
        timeline: SystemTimeline,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kalachakra: Option<KalachakraMeta>,
    },
    NotApplicable {
        reason: String,
    },
    UnsupportedMapping {
        input: String,
    },
}

impl SystemReport {
    /// Summarize a built tree at `query`, reporting `depth` active levels.
    pub fn from_tree(tree: &PeriodTree, query: DateTime<Utc>, depth: u8) -> Result<Self, DashaError> {
        let locator = ActivePeriodLocator::new(tree);
        let chain = locator.snapshot(query, depth.max(2))?;
        let active_len = (depth as usize + 1).min(chain.periods.len());

        let current_antardashas = match chain.periods.first() {
            Some(md) => records(&locator.children_of(md)?),
            None => Vec::new(),
        };
        let current_pratyantardashas = match chain.periods.get(1) {
            Some(ad) => records(&locator.children_of(ad)?),
            None => Vec::new(),
        };

        Ok(Self::Computed {
            active: records(&chain.periods[..active_len]),
            within_horizon: chain.within_horizon,
            timeline: SystemTimeline {
                mahadashas: records(tree.mahadashas()),
                current_antardashas,
                current_pratyantardashas,
            },
            kalachakra: tree.rules().kalachakra_meta(),
        })
    }

    pub fn from_outcome(
        outcome: &TimelineOutcome,
        query: DateTime<Utc>,
        depth: u8,
    ) -> Result<Self, DashaError> {
        match outcome {
            TimelineOutcome::Built(tree) => Self::from_tree(tree, query, depth),
            TimelineOutcome::NotApplicable { reason, .. } => Ok(Self::NotApplicable {
                reason: reason.clone(),
            }),
            TimelineOutcome::UnsupportedMapping { input, .. } => Ok(Self::UnsupportedMapping {
                input: input.clone(),
            }),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed { .. })
    }
}

/// All requested systems for one birth, keyed by system name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashaReport {
    pub birth: DateTime<Utc>,
    pub query: DateTime<Utc>,
    pub moon_longitude: f64,
    pub nakshatra: String,
    pub pada: u8,
    pub systems: BTreeMap<String, SystemReport>,
}

impl DashaReport {
    /// Build every system in `systems` and summarize each at `query`.
    pub fn for_birth(
        birth: &BirthInputs,
        systems: &[DashaSystem],
        query: DateTime<Utc>,
        config: &TimelineConfig,
    ) -> Result<Self, DashaError> {
        let position = crate::nakshatra::NakshatraPosition::from_longitude(birth.moon_longitude)?;
        let mut out = BTreeMap::new();
        for &system in systems {
            let outcome = TimelineBuilder::new(system, *config).build(birth)?;
            let report = SystemReport::from_outcome(&outcome, query, config.depth)?;
            out.insert(system.name().to_string(), report);
        }
        Ok(Self {
            birth: birth.birth,
            query,
            moon_longitude: position.longitude,
            nakshatra: position.nakshatra.name().to_string(),
            pada: position.pada,
            systems: out,
        })
    }
}
