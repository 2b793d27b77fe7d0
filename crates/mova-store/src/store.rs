//! Record store actor and handle.
//!
//! # Dual state: actor vs handle
//!
//! The actor task owns the authoritative `HashMap`s and is the only writer.
//! The handle exposes synchronous reads through `DashMap` mirrors that the
//! actor updates as it processes commands, so views and producers never need
//! an async round-trip to inspect state. Mirrors may trail the queue by the
//! commands still in flight; that staleness window is the same one the whole
//! client already tolerates against the remote store.
//!
//! # Ordering
//!
//! Both producers (optimistic mutator, realtime ingest) send into the same
//! queue. Commands apply in strict arrival order; there is no reordering or
//! coalescing, and the last write wins.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use mova_core::{Order, OrderId, UserId, UserProfile};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::sync_state::{SyncState, Tracked};

// ============================================================================
// Commands
// ============================================================================

/// Where a write came from.
///
/// Authoritative writes (realtime events, refetches) reset the record to
/// `Clean`, overwriting any local overlay. Local writes mark the record
/// `PendingWrite` until the remote side is heard from again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSource {
    Local,
    Authoritative,
}

/// Commands processed by the store actor.
#[derive(Debug)]
pub enum StoreCommand {
    UpsertOrder {
        order: Order,
        source: WriteSource,
    },
    RemoveOrder {
        id: OrderId,
    },
    UpsertProfile {
        profile: UserProfile,
        source: WriteSource,
    },
    RemoveProfile {
        id: UserId,
    },
    /// Authoritative roster refetch: replace all profiles.
    ReplaceProfiles(Vec<UserProfile>),
    /// The remote write for a local order mutation failed.
    MarkOrderDiverged(OrderId),
    /// The remote write for a local profile mutation failed.
    MarkProfileDiverged(UserId),
    /// Graceful shutdown.
    Shutdown,
}

// ============================================================================
// Actor task
// ============================================================================

/// Record store actor.
///
/// Runs in its own tokio task, processing commands sequentially.
pub struct RecordStoreTask {
    rx: mpsc::Receiver<StoreCommand>,

    /// Authoritative state.
    orders: HashMap<OrderId, Tracked<Order>>,
    profiles: HashMap<UserId, Tracked<UserProfile>>,

    // === Mirrors shared with the handle (updated here only) ===
    orders_data: Arc<DashMap<OrderId, Tracked<Order>>>,
    profiles_data: Arc<DashMap<UserId, Tracked<UserProfile>>>,

    /// Fired (non-blocking) when any profile changes, so the reconciliation
    /// loop can run immediately instead of waiting for its interval.
    reconcile_trigger: Option<mpsc::Sender<()>>,
}

impl RecordStoreTask {
    /// Run the actor until `Shutdown` or all senders drop.
    pub async fn run(mut self) {
        debug!("RecordStoreTask started");

        while let Some(command) = self.rx.recv().await {
            if matches!(command, StoreCommand::Shutdown) {
                debug!("RecordStoreTask shutting down");
                break;
            }
            self.handle_command(command);
        }

        debug!("RecordStoreTask terminated");
    }

    fn handle_command(&mut self, command: StoreCommand) {
        match command {
            StoreCommand::UpsertOrder { order, source } => self.on_upsert_order(order, source),
            StoreCommand::RemoveOrder { id } => self.on_remove_order(&id),
            StoreCommand::UpsertProfile { profile, source } => {
                self.on_upsert_profile(profile, source);
            }
            StoreCommand::RemoveProfile { id } => self.on_remove_profile(&id),
            StoreCommand::ReplaceProfiles(profiles) => self.on_replace_profiles(profiles),
            StoreCommand::MarkOrderDiverged(id) => {
                if let Some(entry) = self.orders.get_mut(&id) {
                    entry.sync = SyncState::Diverged;
                    self.orders_data.insert(id, entry.clone());
                }
            }
            StoreCommand::MarkProfileDiverged(id) => {
                if let Some(entry) = self.profiles.get_mut(&id) {
                    entry.sync = SyncState::Diverged;
                    self.profiles_data.insert(id, entry.clone());
                }
            }
            StoreCommand::Shutdown => unreachable!("Shutdown handled in run()"),
        }
    }

    fn on_upsert_order(&mut self, order: Order, source: WriteSource) {
        trace!(order = %order.id, ?source, "upsert order");
        let tracked = match source {
            WriteSource::Local => Tracked::pending(order),
            WriteSource::Authoritative => Tracked::clean(order),
        };
        self.orders_data.insert(tracked.entity.id.clone(), tracked.clone());
        self.orders.insert(tracked.entity.id.clone(), tracked);
    }

    fn on_remove_order(&mut self, id: &OrderId) {
        trace!(order = %id, "remove order");
        self.orders.remove(id);
        self.orders_data.remove(id);
    }

    fn on_upsert_profile(&mut self, profile: UserProfile, source: WriteSource) {
        trace!(profile = %profile.id, ?source, "upsert profile");
        let tracked = match source {
            WriteSource::Local => Tracked::pending(profile),
            WriteSource::Authoritative => Tracked::clean(profile),
        };
        self.profiles_data
            .insert(tracked.entity.id.clone(), tracked.clone());
        self.profiles.insert(tracked.entity.id.clone(), tracked);
        self.fire_reconcile_trigger();
    }

    fn on_remove_profile(&mut self, id: &UserId) {
        trace!(profile = %id, "remove profile");
        self.profiles.remove(id);
        self.profiles_data.remove(id);
        self.fire_reconcile_trigger();
    }

    /// Authoritative roster replace.
    ///
    /// Records with unconfirmed local intent are NOT skipped: the refetch is
    /// the authoritative read that overwrites the optimistic overlay.
    fn on_replace_profiles(&mut self, profiles: Vec<UserProfile>) {
        debug!(
            existing = self.profiles.len(),
            incoming = profiles.len(),
            "replacing profile roster"
        );

        let incoming_ids: std::collections::HashSet<UserId> =
            profiles.iter().map(|p| p.id.clone()).collect();

        for profile in profiles {
            let tracked = Tracked::clean(profile);
            self.profiles_data
                .insert(tracked.entity.id.clone(), tracked.clone());
            self.profiles.insert(tracked.entity.id.clone(), tracked);
        }

        let stale: Vec<UserId> = self
            .profiles
            .keys()
            .filter(|id| !incoming_ids.contains(*id))
            .cloned()
            .collect();
        for id in stale {
            self.profiles.remove(&id);
            self.profiles_data.remove(&id);
        }

        self.fire_reconcile_trigger();
    }

    fn fire_reconcile_trigger(&self) {
        if let Some(tx) = &self.reconcile_trigger {
            // Full channel means a tick is already queued.
            let _ = tx.try_send(());
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Handle for interacting with the record store actor.
///
/// Async methods enqueue commands; sync methods read the mirrors.
#[derive(Clone)]
pub struct RecordStoreHandle {
    tx: mpsc::Sender<StoreCommand>,
    orders_data: Arc<DashMap<OrderId, Tracked<Order>>>,
    profiles_data: Arc<DashMap<UserId, Tracked<UserProfile>>>,
}

impl RecordStoreHandle {
    // === Async methods (enqueue commands) ===

    pub async fn upsert_order(&self, order: Order, source: WriteSource) {
        let _ = self.tx.send(StoreCommand::UpsertOrder { order, source }).await;
    }

    pub async fn remove_order(&self, id: OrderId) {
        let _ = self.tx.send(StoreCommand::RemoveOrder { id }).await;
    }

    pub async fn upsert_profile(&self, profile: UserProfile, source: WriteSource) {
        let _ = self
            .tx
            .send(StoreCommand::UpsertProfile { profile, source })
            .await;
    }

    pub async fn remove_profile(&self, id: UserId) {
        let _ = self.tx.send(StoreCommand::RemoveProfile { id }).await;
    }

    pub async fn replace_profiles(&self, profiles: Vec<UserProfile>) {
        let _ = self.tx.send(StoreCommand::ReplaceProfiles(profiles)).await;
    }

    pub async fn mark_order_diverged(&self, id: OrderId) {
        let _ = self.tx.send(StoreCommand::MarkOrderDiverged(id)).await;
    }

    pub async fn mark_profile_diverged(&self, id: UserId) {
        let _ = self.tx.send(StoreCommand::MarkProfileDiverged(id)).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(StoreCommand::Shutdown).await;
    }

    // === Sync methods (mirror lookups) ===

    #[must_use]
    pub fn get_order(&self, id: &OrderId) -> Option<Order> {
        self.orders_data.get(id).map(|r| r.entity.clone())
    }

    #[must_use]
    pub fn order_sync_state(&self, id: &OrderId) -> Option<SyncState> {
        self.orders_data.get(id).map(|r| r.sync)
    }

    #[must_use]
    pub fn orders_snapshot(&self) -> Vec<Order> {
        self.orders_data.iter().map(|r| r.entity.clone()).collect()
    }

    #[must_use]
    pub fn get_profile(&self, id: &UserId) -> Option<UserProfile> {
        self.profiles_data.get(id).map(|r| r.entity.clone())
    }

    #[must_use]
    pub fn profile_sync_state(&self, id: &UserId) -> Option<SyncState> {
        self.profiles_data.get(id).map(|r| r.sync)
    }

    #[must_use]
    pub fn profiles_snapshot(&self) -> Vec<UserProfile> {
        self.profiles_data.iter().map(|r| r.entity.clone()).collect()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders_data.len()
    }

    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.profiles_data.len()
    }
}

// ============================================================================
// Spawn function
// ============================================================================

/// Spawn the record store actor.
///
/// `reconcile_trigger` is fired (non-blocking) on every profile change.
#[must_use]
pub fn spawn_record_store(
    capacity: usize,
    reconcile_trigger: Option<mpsc::Sender<()>>,
) -> (RecordStoreHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);

    let orders_data = Arc::new(DashMap::new());
    let profiles_data = Arc::new(DashMap::new());

    let task = RecordStoreTask {
        rx,
        orders: HashMap::new(),
        profiles: HashMap::new(),
        orders_data: orders_data.clone(),
        profiles_data: profiles_data.clone(),
        reconcile_trigger,
    };

    let handle = RecordStoreHandle {
        tx,
        orders_data,
        profiles_data,
    };

    let join_handle = tokio::spawn(task.run());

    (handle, join_handle)
}

// ============================================================================
// Tests
// ============================================================================
