//! Error types for event search.

use chrono::{DateTime, Utc};
use kaala_dasha::DashaError;

/// Errors from root finding, ephemeris access and search orchestration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SearchError {
    /// No genuine sign change was found, including after every widening.
    #[error("no solution found in [{window_start}, {window_end}] after {attempts} attempt(s)")]
    NoSolutionFound {
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        attempts: u32,
    },
    /// A search configuration failed validation.
    #[error("invalid search configuration: {0}")]
    InvalidConfig(&'static str),
    /// The ephemeris provider could not produce a position.
    #[error("ephemeris error: {0}")]
    Ephemeris(String),
    /// A body name that does not match any supported body.
    #[error("unknown body: {0}")]
    UnknownBody(String),
    /// Dasha construction failed.
    #[error(transparent)]
    Dasha(#[from] DashaError),
}
