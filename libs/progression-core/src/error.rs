//! Error types for progression logic.

use thiserror::Error;

/// Errors from domain-level validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressionError {
    /// Quiz score outside the 0-100 integer percent range.
    #[error("invalid quiz score: {0} (expected 0-100)")]
    InvalidScore(u32),
}

/// Result type alias for progression operations.
pub type Result<T> = std::result::Result<T, ProgressionError>;
