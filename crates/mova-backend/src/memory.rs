//! In-memory DataStore for tests and local mode.
//!
//! Keeps both tables in process and broadcasts order changes to subscribers,
//! which makes multi-actor scenarios (customer and executor clients sharing
//! one store) reproducible in tests. Write failures can be injected to
//! exercise the optimistic-divergence path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use mova_core::{Order, OrderId, OrderStatus, UserId, UserProfile};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::datastore::{BoxFuture, ChangeEvent, DataStore, OrderFilter};
use crate::error::{BackendError, BackendResult};

/// Capacity of each subscriber's event channel.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

/// In-memory store with change broadcast.
#[derive(Default)]
pub struct MemoryDataStore {
    orders: Mutex<HashMap<OrderId, Order>>,
    profiles: Mutex<HashMap<UserId, UserProfile>>,
    subscribers: Mutex<Vec<mpsc::Sender<ChangeEvent>>>,
    /// When set, every write returns a simulated transport failure.
    fail_writes: AtomicBool,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated write failures.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a profile without broadcasting (profiles are not streamed).
    pub fn seed_profile(&self, profile: UserProfile) {
        self.profiles.lock().insert(profile.id.clone(), profile);
    }

    /// Seed an order without broadcasting.
    pub fn seed_order(&self, order: Order) {
        self.orders.lock().insert(order.id.clone(), order);
    }

    /// Directly mutate a stored profile, as a counterpart actor would from
    /// another session. Not broadcast; profiles travel by refetch.
    pub fn mutate_profile(&self, id: &UserId, mutate: impl FnOnce(&mut UserProfile)) -> bool {
        let mut profiles = self.profiles.lock();
        match profiles.get_mut(id) {
            Some(profile) => {
                mutate(profile);
                true
            }
            None => false,
        }
    }

    /// Push a change event to all live subscribers.
    fn broadcast(&self, event: ChangeEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("memory store subscriber lagging, dropping event for it");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    fn check_write_allowed(&self) -> BackendResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                code: 503,
                body: "simulated write failure".to_string(),
            });
        }
        Ok(())
    }
}

impl DataStore for MemoryDataStore {
    fn list_orders(&self, filter: OrderFilter) -> BoxFuture<'_, BackendResult<Vec<Order>>> {
        let orders = self.orders.lock();
        let matched: Vec<Order> = orders
            .values()
            .filter(|order| match &filter {
                OrderFilter::All => true,
                OrderFilter::ByCustomer(id) => &order.customer_id == id,
                OrderFilter::ByExecutor(id) => order.executor_id.as_ref() == Some(id),
                OrderFilter::Open => order.status == OrderStatus::Open,
            })
            .cloned()
            .collect();
        Box::pin(async move { Ok(matched) })
    }

    fn insert_order(&self, order: &Order) -> BoxFuture<'_, BackendResult<Order>> {
        let result = self.check_write_allowed().map(|()| {
            let stored = order.clone();
            self.orders.lock().insert(stored.id.clone(), stored.clone());
            self.broadcast(ChangeEvent::Inserted(stored.clone()));
            stored
        });
        Box::pin(async move { result })
    }

    fn update_order(&self, order: &Order) -> BoxFuture<'_, BackendResult<()>> {
        let result = self.check_write_allowed().map(|()| {
            let stored = order.clone();
            self.orders.lock().insert(stored.id.clone(), stored.clone());
            self.broadcast(ChangeEvent::Updated(stored));
        });
        Box::pin(async move { result })
    }

    fn delete_order(&self, id: &OrderId) -> BoxFuture<'_, BackendResult<()>> {
        let result = self.check_write_allowed().map(|()| {
            if self.orders.lock().remove(id).is_some() {
                self.broadcast(ChangeEvent::Deleted(id.clone()));
            }
        });
        Box::pin(async move { result })
    }

    fn fetch_profile(&self, id: &UserId) -> BoxFuture<'_, BackendResult<Option<UserProfile>>> {
        let profile = self.profiles.lock().get(id).cloned();
        Box::pin(async move { Ok(profile) })
    }

    fn list_profiles(&self) -> BoxFuture<'_, BackendResult<Vec<UserProfile>>> {
        let profiles: Vec<UserProfile> = self.profiles.lock().values().cloned().collect();
        Box::pin(async move { Ok(profiles) })
    }

    fn update_profile(&self, profile: &UserProfile) -> BoxFuture<'_, BackendResult<()>> {
        let result = self.check_write_allowed().map(|()| {
            self.profiles
                .lock()
                .insert(profile.id.clone(), profile.clone());
        });
        Box::pin(async move { result })
    }

    fn subscribe_orders(&self) -> BoxFuture<'_, BackendResult<mpsc::Receiver<ChangeEvent>>> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.subscribers.lock().push(tx);
        Box::pin(async move { Ok(rx) })
    }
}
