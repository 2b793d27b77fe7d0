//! Backend error types.

use thiserror::Error;

/// Errors from DataStore implementations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Row decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Row is missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Change stream closed")]
    StreamClosed,
}

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Auth/session failures.
///
/// Kept distinct from [`BackendError`]: a session failure forces the actor to
/// a logged-out view instead of degrading to stale local state.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No active session")]
    NotSignedIn,

    #[error("Session expired")]
    SessionExpired,

    #[error("Auth transport error: {0}")]
    Transport(String),
}
