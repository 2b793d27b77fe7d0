//! User profile entity.

use crate::ids::UserId;
use crate::location::Location;
use crate::notification::Notification;
use crate::subscription::{SubscriptionSignal, SubscriptionStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actor role driving client-side logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Executor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Executor => write!(f, "executor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// A service an executor offers, with its own price and enablement flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffer {
    pub service_id: String,
    pub price: Decimal,
    pub enabled: bool,
}

/// An immutable review attached to an executor profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author_id: UserId,
    pub author_name: String,
    /// 1..=5.
    pub rating: u8,
    pub text: String,
    pub date: DateTime<Utc>,
}

/// A user profile, 1:1 with an auth identity.
///
/// The subscription relation is meant to be symmetric while `Active`
/// (`subscribed_to_customer_id` on the executor row mirroring
/// `subscribed_executor_id` on the customer row), but the backing store gives
/// no cross-row transactional guarantee. Transient asymmetry is an expected
/// state; the reconciliation loop detects and heals it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub role: Role,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub coverage_radius_km: Option<f64>,

    // Executor-only fields.
    #[serde(default)]
    pub custom_services: Vec<ServiceOffer>,
    #[serde(default)]
    pub vehicle_photo_url: Option<String>,
    /// Mean of review ratings, exact decimal.
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub reviews_count: u32,
    #[serde(default)]
    pub reviews: Vec<Review>,

    // Subscription fields, cooperatively mutated by the counterpart actor.
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default)]
    pub subscription_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription_end_date: Option<DateTime<Utc>>,
    /// Executor → customer link while active.
    #[serde(default)]
    pub subscribed_to_customer_id: Option<UserId>,
    /// Decoded shared request/rejection column.
    #[serde(default)]
    pub subscription_request: SubscriptionSignal,
    /// Customer → executor link while active.
    #[serde(default)]
    pub subscribed_executor_id: Option<UserId>,

    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl UserProfile {
    /// Create a minimal profile as registration would.
    pub fn new(id: UserId, role: Role, name: impl Into<String>) -> Self {
        Self {
            id,
            role,
            name: name.into(),
            phone: None,
            avatar_url: None,
            description: None,
            location: None,
            coverage_radius_km: None,
            custom_services: Vec::new(),
            vehicle_photo_url: None,
            rating: Decimal::ZERO,
            reviews_count: 0,
            reviews: Vec::new(),
            subscription_status: SubscriptionStatus::None,
            subscription_start_date: None,
            subscription_end_date: None,
            subscribed_to_customer_id: None,
            subscription_request: SubscriptionSignal::None,
            subscribed_executor_id: None,
            notifications: Vec::new(),
        }
    }

    pub fn is_executor(&self) -> bool {
        self.role == Role::Executor
    }

    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }

    /// Append a review and recompute the mean rating and count.
    pub fn apply_review(&mut self, review: Review) {
        self.reviews.push(review);
        self.reviews_count = self.reviews.len() as u32;
        let sum: Decimal = self
            .reviews
            .iter()
            .map(|r| Decimal::from(r.rating))
            .sum();
        self.rating = sum / Decimal::from(self.reviews.len() as u64);
    }

    /// Mean price over enabled services.
    ///
    /// Returns `None` when no enabled service has a positive price, so
    /// callers can sort those profiles last.
    pub fn mean_enabled_price(&self) -> Option<Decimal> {
        let priced: Vec<Decimal> = self
            .custom_services
            .iter()
            .filter(|s| s.enabled && s.price > Decimal::ZERO)
            .map(|s| s.price)
            .collect();
        if priced.is_empty() {
            return None;
        }
        let sum: Decimal = priced.iter().sum();
        Some(sum / Decimal::from(priced.len() as u64))
    }
}
