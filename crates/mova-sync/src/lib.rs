//! Optimistic mutation and realtime ingest.
//!
//! Two producers feed the record store queue: the optimistic mutator (local
//! intent, applied before the network confirms) and the realtime ingest
//! (authoritative change events from the orders table). Profiles take the
//! third path, a periodic full refetch. Notifications derived from observed
//! transitions are appended through a pure, deduplicating helper.

pub mod error;
pub mod ingest;
pub mod mutation;
pub mod mutator;
pub mod notify;
pub mod refresh;

pub use error::{MutationError, MutationResult};
pub use ingest::{is_relevant, RealtimeIngest};
pub use mutation::{Mutation, ProfilePatch};
pub use mutator::OptimisticMutator;
pub use notify::{append_notification, DedupePolicy};
pub use refresh::ProfileRefresher;
