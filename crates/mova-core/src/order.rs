//! Order entity and status lifecycle.

use crate::error::{CoreError, Result};
use crate::ids::{OrderId, UserId};
use crate::location::OrderLocation;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status.
///
/// Lifecycle: created as `Pending` (executor pre-selected) or `Open`
/// (marketplace), mutated by executor (accept/reject), customer
/// (cancel/complete), or any executor while `Open` (respond/claim).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Waiting for a pre-selected executor to accept.
    Pending,
    /// Unbound; visible to all eligible executors for claiming.
    Open,
    /// Bound to an executor.
    Confirmed,
    /// Completed by the customer, rating/review attached.
    Completed,
    /// Cancelled by the customer.
    Cancelled,
    /// Terminally rejected (not reopened).
    Rejected,
}

impl OrderStatus {
    /// Terminal statuses permit deletion by the customer.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Open => write!(f, "open"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Kind of assistance service, determining the order's location shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Point-to-point transfer: carries a from/to route.
    Transfer,
    /// Accompaniment within an area: carries a single general location.
    Accompaniment,
}

impl ServiceKind {
    /// Whether orders of this kind carry a from/to route.
    pub fn uses_route(&self) -> bool {
        matches!(self, Self::Transfer)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "transfer"),
            Self::Accompaniment => write!(f, "accompaniment"),
        }
    }
}

/// A mobility-assistance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    /// Bound executor. Set implies status is past `Open`.
    #[serde(default)]
    pub executor_id: Option<UserId>,
    pub service: ServiceKind,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: OrderStatus,
    pub total_price: Decimal,
    #[serde(default)]
    pub details: Option<String>,
    /// Reason from the most recent rejection, shown to the customer.
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Whether the customer allowed open marketplace selection at creation.
    #[serde(default)]
    pub allow_open_selection: bool,
    /// Executors who responded while the order was open, in response order.
    #[serde(default)]
    pub responses: Vec<UserId>,
    #[serde(default)]
    pub voice_message_url: Option<String>,
    /// Rating attached on completion (1..=5).
    #[serde(default)]
    pub rating: Option<u8>,
    /// Review text attached on completion.
    #[serde(default)]
    pub review: Option<String>,
    pub location: OrderLocation,
}

impl Order {
    /// Create a new order on behalf of a customer.
    ///
    /// Status is `Pending` when an executor is pre-selected, `Open` otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: UserId,
        executor_id: Option<UserId>,
        service: ServiceKind,
        date: NaiveDate,
        time: NaiveTime,
        total_price: Decimal,
        location: OrderLocation,
    ) -> Result<Self> {
        let order = Self {
            id: OrderId::generate(),
            customer_id,
            status: if executor_id.is_some() {
                OrderStatus::Pending
            } else {
                OrderStatus::Open
            },
            executor_id,
            service,
            date,
            time,
            total_price,
            details: None,
            rejection_reason: None,
            allow_open_selection: false,
            responses: Vec::new(),
            voice_message_url: None,
            rating: None,
            review: None,
            location,
        };
        order.check_invariants()?;
        Ok(order)
    }

    /// Validate the structural invariants that callers must uphold.
    ///
    /// - `Confirmed` implies a bound executor
    /// - `Open` implies no bound executor
    /// - the customer never appears in `responses`
    /// - the location shape matches the service kind
    pub fn check_invariants(&self) -> Result<()> {
        if self.status == OrderStatus::Confirmed && self.executor_id.is_none() {
            return Err(CoreError::EmptyField("executor_id"));
        }
        if self.status == OrderStatus::Open && self.executor_id.is_some() {
            return Err(CoreError::InvalidId(format!(
                "open order {} has bound executor",
                self.id
            )));
        }
        if self.responses.contains(&self.customer_id) {
            return Err(CoreError::InvalidId(format!(
                "order {} has customer in responses",
                self.id
            )));
        }
        if self.location.is_route() != self.service.uses_route() {
            return Err(CoreError::LocationMismatch(self.service.to_string()));
        }
        Ok(())
    }

    /// Whether this order is open for marketplace responses.
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Whether this order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Validate a completion rating (1..=5).
pub fn validate_rating(rating: u8) -> Result<u8> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(CoreError::InvalidRating(rating))
    }
}
