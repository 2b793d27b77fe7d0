//! Per-record synchronization state.
//!
//! Optimistic local writes are a one-way overlay: they are only ever
//! overwritten by the next authoritative read, never reverted. The overlay
//! state is tracked explicitly per record so the weak guarantee stays
//! auditable in tests instead of being a silent best-effort mutation.

use std::fmt;

/// How a locally-held record relates to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Matches the last authoritative read.
    #[default]
    Clean,
    /// A local mutation was applied; the remote write has not confirmed.
    PendingWrite,
    /// The remote write for a local mutation failed. The record stays
    /// divergent until the next authoritative read overwrites it.
    Diverged,
}

impl SyncState {
    /// Whether the record carries unconfirmed local intent.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Clean)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::PendingWrite => write!(f, "pending_write"),
            Self::Diverged => write!(f, "diverged"),
        }
    }
}

/// A record plus its overlay state.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    pub entity: T,
    pub sync: SyncState,
}

impl<T> Tracked<T> {
    /// Wrap an authoritative read.
    pub fn clean(entity: T) -> Self {
        Self {
            entity,
            sync: SyncState::Clean,
        }
    }

    /// Wrap an optimistic local write.
    pub fn pending(entity: T) -> Self {
        Self {
            entity,
            sync: SyncState::PendingWrite,
        }
    }
}
