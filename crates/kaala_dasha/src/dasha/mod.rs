//! Dasha (planetary period) timelines for four classical systems.
//!
//! Supported systems:
//! - Vimshottari (120-year cycle, 9 grahas)
//! - Yogini (36-year cycle, 8 yoginis)
//! - Ashtottari (108-year cycle, 8 grahas, conditional)
//! - Kalachakra (sign progressions by nakshatra group and pada)

pub mod kalachakra;
pub mod kalachakra_data;
pub mod locator;
pub mod nakshatra_rules;
pub mod report;
pub mod subperiod;
pub mod system;
pub mod timeline;
pub mod types;
pub mod yogini;
pub mod yogini_data;

pub use kalachakra::{KALACHAKRA_CHILD_COUNT, KalachakraMeta, KalachakraRules};
pub use kalachakra_data::{KALACHAKRA_SIGN_YEARS, KalachakraGroup, KalachakraRow, kalachakra_row};
pub use locator::{ActivePeriodLocator, find_active_period};
pub use nakshatra_rules::{
    ASHTOTTARI_SEQUENCE, NakshatraDashaRules, VIMSHOTTARI_SEQUENCE, ashtottari_rules,
    nakshatra_lord, vimshottari_rules,
};
pub use report::{DashaReport, PeriodRecord, SystemReport, SystemTimeline};
pub use subperiod::proportional_children;
pub use system::{Inapplicable, PeriodSystem, Slot, StartingState, SystemRules};
pub use timeline::{
    BirthInputs, PeriodTree, TimelineBuilder, TimelineConfig, TimelineOutcome, complete_level,
    level0,
};
pub use types::{
    ALL_DASHA_SYSTEMS, DAYS_PER_YEAR, DEFAULT_DASHA_LEVEL, DEFAULT_HORIZON_YEARS, DashaEntity,
    DashaLevel, DashaPeriod, DashaSnapshot, DashaSystem, MAX_DASHA_LEVEL, MAX_EAGER_DASHA_LEVEL,
    MAX_PERIODS_PER_LEVEL,
};
pub use yogini::YoginiRules;
pub use yogini_data::{YOGINI_LORDS, YOGINI_NAMES};
