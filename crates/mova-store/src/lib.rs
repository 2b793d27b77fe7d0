//! Local record store for the Mova sync core.
//!
//! A single-consumer actor owns the authoritative in-memory mirror of remote
//! `Order` and `UserProfile` state. Optimistic mutations and realtime events
//! are both funneled through one command queue, so they apply in strict
//! arrival order without any locking. Read access goes through handle-side
//! mirrors that only the actor updates.

pub mod store;
pub mod sync_state;

pub use store::{
    spawn_record_store, RecordStoreHandle, RecordStoreTask, StoreCommand, WriteSource,
};
pub use sync_state::SyncState;
