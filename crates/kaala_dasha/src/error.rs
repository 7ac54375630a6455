//! Error types for dasha calculations.

/// Errors from timeline construction and lookup.
///
/// Inapplicable systems are not errors; see
/// [`TimelineOutcome`](crate::dasha::TimelineOutcome).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum DashaError {
    /// A caller-supplied value is out of range or non-finite.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A level would exceed `MAX_PERIODS_PER_LEVEL`.
    #[error("{level} level would hold {count} periods (limit {limit})")]
    TooManyPeriods {
        level: &'static str,
        count: usize,
        limit: usize,
    },
    /// A Kalachakra row names a marker sign that is not in its sequence.
    #[error("kalachakra table defect: {role} sign {sign} is not in the 9-sign sequence")]
    KalachakraTable {
        sign: &'static str,
        role: &'static str,
    },
    /// A system name that does not match any supported system.
    #[error("unknown dasha system: {0}")]
    UnknownSystem(String),
}
