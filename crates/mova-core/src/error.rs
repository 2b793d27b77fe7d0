//! Error types for mova-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid rating: {0} (must be 1..=5)")]
    InvalidRating(u8),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Location shape does not match service kind: {0}")]
    LocationMismatch(String),

    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
