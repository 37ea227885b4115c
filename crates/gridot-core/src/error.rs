//! Error types for GridOT Core

use thiserror::Error;

/// Core error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A `Set` entry's old value disagrees with the live snapshot. The replica
    /// has diverged from the state the operation was generated against.
    #[error("Operation does not apply at ({row}, {col}): {reason}")]
    Apply { row: usize, col: usize, reason: String },

    #[error("Unknown operation component: {0}")]
    UnknownOperation(String),

    #[error("Invalid side: {0} (expected \"left\" or \"right\")")]
    InvalidSide(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for GridOT Core operations
pub type Result<T> = std::result::Result<T, Error>;
