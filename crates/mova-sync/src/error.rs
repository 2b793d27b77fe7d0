//! Sync error types.

use mova_core::{OrderId, UserId};
use thiserror::Error;

/// Mutation failures.
///
/// All variants are raised *before* the optimistic apply and surfaced
/// synchronously to the caller; once a mutation passes validation nothing in
/// the remote path can fail it anymore (a failed remote write diverges state,
/// it does not error the mutation).
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order not found locally: {0}")]
    MissingOrder(OrderId),

    #[error("Profile not found locally: {0}")]
    MissingProfile(UserId),

    #[error("Mutation requires role {required}, actor is {actual}")]
    WrongRole {
        required: &'static str,
        actual: mova_core::Role,
    },
}

pub type MutationResult<T> = Result<T, MutationError>;
