//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(#[from] mova_backend::BackendError),

    /// Session failure: the caller must fall back to the logged-out view.
    #[error("Auth error: {0}")]
    Auth(#[from] mova_backend::AuthError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] mova_sync::MutationError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] mova_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
