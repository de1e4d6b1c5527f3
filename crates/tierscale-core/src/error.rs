//! Error types for tier parsing, catalog lookups, and policy validation.

use thiserror::Error;

/// Result type alias for tier and catalog operations.
pub type TierResult<T> = Result<T, TierError>;

/// Errors raised while decoding a tier label or resolving it in the catalog.
///
/// All variants abort the current evaluation. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierError {
    #[error("'{label}' is not a valid tier label: {detail}")]
    InvalidTierFormat { label: String, detail: String },

    #[error("generation {0} is not present in the tier catalog")]
    UnknownGeneration(u32),

    #[error("tier {0} is not a member of the tier catalog")]
    TierNotInCatalog(String),

    #[error("catalog entry {label} listed under generation {expected}")]
    CatalogMismatch { label: String, expected: u32 },
}

impl TierError {
    pub(crate) fn invalid(label: &str, detail: impl Into<String>) -> Self {
        TierError::InvalidTierFormat {
            label: label.to_string(),
            detail: detail.into(),
        }
    }
}

/// Errors raised when a scaling policy violates its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("min_cores ({min}) exceeds max_cores ({max})")]
    CoreBounds { min: u32, max: u32 },

    #[error("thresholds must satisfy 0 <= low ({low}) < high ({high}) <= 100")]
    Thresholds { low: f64, high: f64 },

    #[error("required_data_points must be at least 1")]
    DataPoints,
}
