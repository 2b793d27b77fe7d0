//! Core domain types for the Mova marketplace sync client.
//!
//! This crate provides the entity types shared across the sync core:
//! - `Order`: a mobility-assistance order and its status lifecycle
//! - `UserProfile`: customer/executor/admin profile with subscription state
//! - `Review`, `Notification`: append-only records attached to profiles
//! - `SubscriptionSignal`: decoded form of the wire-level rejection sentinel

pub mod error;
pub mod ids;
pub mod location;
pub mod notification;
pub mod order;
pub mod profile;
pub mod subscription;

pub use error::{CoreError, Result};
pub use ids::{OrderId, UserId};
pub use location::{GeoPoint, Location, OrderLocation};
pub use notification::{Notification, NotificationKind};
pub use order::{validate_rating, Order, OrderStatus, ServiceKind};
pub use profile::{Review, Role, ServiceOffer, UserProfile};
pub use subscription::{SubscriptionSignal, SubscriptionStatus, REJECTED_PREFIX};
