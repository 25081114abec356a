//! Error types for island generation

use std::fmt;

use crate::features::FeatureStateName;

/// Errors from configuration and feature bookkeeping
///
/// Local failures (a feature that cannot be placed, a degenerate triangle,
/// too few path nodes, a collapsed contour) are not errors; they are reported through
/// [`Diagnostics`](crate::Diagnostics) instead.
#[derive(Debug, Clone, PartialEq)]
pub enum IslandError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// Requested feature ID does not exist
    FeatureNotFound(u32),
    /// A feature transition was requested from the wrong state
    InvalidFeatureState {
        /// Feature that rejected the transition
        id: u32,
        /// State the transition requires
        expected: FeatureStateName,
        /// State the feature was actually in
        found: FeatureStateName,
    },
}

impl fmt::Display for IslandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IslandError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            IslandError::FeatureNotFound(id) => write!(f, "feature not found: {}", id),
            IslandError::InvalidFeatureState { id, expected, found } => write!(
                f,
                "feature {} must be {:?} for this transition (is {:?})",
                id, expected, found
            ),
        }
    }
}

impl std::error::Error for IslandError {}

/// Result type alias for island operations
pub type Result<T> = std::result::Result<T, IslandError>;
