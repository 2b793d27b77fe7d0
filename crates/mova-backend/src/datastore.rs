//! The DataStore contract consumed by the sync core.
//!
//! Provides a trait-based abstraction over the hosted backend-as-a-service:
//! typed selects and writes for the two entity tables plus a change-event
//! stream for the orders table. Profiles are not streamed; they are refreshed
//! by periodic full refetch. The asymmetry is deliberate: order state churns
//! under multi-actor mutation, the roster does not.

use std::pin::Pin;

use mova_core::{Order, OrderId, UserId, UserProfile};
use tokio::sync::mpsc;

use crate::error::BackendResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// A change pushed from the orders table.
///
/// Events carry full rows already mapped to entities; deletes carry only the
/// id (the store does not replay the removed row).
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Inserted(Order),
    Updated(Order),
    Deleted(OrderId),
}

impl ChangeEvent {
    /// Id of the order this event refers to.
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Inserted(order) | Self::Updated(order) => &order.id,
            Self::Deleted(id) => id,
        }
    }
}

/// Server-side filter for order selects.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderFilter {
    All,
    ByCustomer(UserId),
    ByExecutor(UserId),
    Open,
}

/// Typed access to the remote store.
///
/// Implementations map entities to their table rows internally; callers never
/// see raw rows. All writes are last-writer-wins whole-entity upserts: the
/// store offers no cross-row transaction, which is exactly the gap the
/// reconciliation loop papers over.
pub trait DataStore: Send + Sync {
    /// Select orders matching a filter.
    fn list_orders(&self, filter: OrderFilter) -> BoxFuture<'_, BackendResult<Vec<Order>>>;

    /// Insert a new order, returning the stored entity.
    fn insert_order(&self, order: &Order) -> BoxFuture<'_, BackendResult<Order>>;

    /// Replace an order row by id.
    fn update_order(&self, order: &Order) -> BoxFuture<'_, BackendResult<()>>;

    /// Delete an order row by id.
    fn delete_order(&self, id: &OrderId) -> BoxFuture<'_, BackendResult<()>>;

    /// Fetch a single profile by id.
    fn fetch_profile(&self, id: &UserId) -> BoxFuture<'_, BackendResult<Option<UserProfile>>>;

    /// Select all profiles (periodic full refetch).
    fn list_profiles(&self) -> BoxFuture<'_, BackendResult<Vec<UserProfile>>>;

    /// Replace a profile row by id.
    fn update_profile(&self, profile: &UserProfile) -> BoxFuture<'_, BackendResult<()>>;

    /// Subscribe to insert/update/delete events on the orders table.
    ///
    /// Events arrive in store commit order; the receiver is the single
    /// consumer feeding the local record store.
    fn subscribe_orders(&self) -> BoxFuture<'_, BackendResult<mpsc::Receiver<ChangeEvent>>>;
}
