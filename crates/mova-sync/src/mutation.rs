//! The closed mutation set.
//!
//! Every state change the client can initiate is one of these variants; each
//! has a fixed field-level transform applied by the mutator (including the
//! surprising one: RejectOrder always reopens, see the mutator).

use chrono::{DateTime, Utc};
use mova_core::{
    Location, Notification, OrderId, ServiceOffer, SubscriptionSignal, SubscriptionStatus, UserId,
    UserProfile,
};

/// A client-initiated state change.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Executor accepts a pending order assigned to them.
    AcceptOrder { order_id: OrderId },
    /// Executor rejects an order; it always reopens.
    RejectOrder { order_id: OrderId, reason: String },
    /// Executor claims an open order outright.
    ClaimOpenOrder { order_id: OrderId },
    /// Executor responds to an open order without claiming it.
    RespondToOpenOrder { order_id: OrderId },
    /// Customer picks one of the responders.
    SelectExecutor {
        order_id: OrderId,
        executor_id: UserId,
    },
    /// Customer completes a confirmed order, attaching rating and review.
    CompleteOrder {
        order_id: OrderId,
        rating: u8,
        review: Option<String>,
    },
    /// Customer cancels an order.
    CancelOrder { order_id: OrderId },
    /// Customer deletes a terminal order.
    DeleteOrder { order_id: OrderId },
    /// Executor requests a subscription to a customer.
    RequestSubscription { customer_id: UserId },
    /// Customer confirms a pending subscription request.
    ConfirmSubscription { executor_id: UserId },
    /// Customer rejects a pending subscription request.
    RejectSubscription { executor_id: UserId },
    /// Either party cancels an existing subscription.
    CancelSubscription { reason: Option<String> },
    /// Actor edits their own profile.
    UpdateProfile { patch: ProfilePatch },
    /// Actor dismisses one of their notifications.
    DismissNotification { notification_id: String },
}

impl Mutation {
    /// Stable label for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AcceptOrder { .. } => "accept_order",
            Self::RejectOrder { .. } => "reject_order",
            Self::ClaimOpenOrder { .. } => "claim_open_order",
            Self::RespondToOpenOrder { .. } => "respond_to_open_order",
            Self::SelectExecutor { .. } => "select_executor",
            Self::CompleteOrder { .. } => "complete_order",
            Self::CancelOrder { .. } => "cancel_order",
            Self::DeleteOrder { .. } => "delete_order",
            Self::RequestSubscription { .. } => "request_subscription",
            Self::ConfirmSubscription { .. } => "confirm_subscription",
            Self::RejectSubscription { .. } => "reject_subscription",
            Self::CancelSubscription { .. } => "cancel_subscription",
            Self::UpdateProfile { .. } => "update_profile",
            Self::DismissNotification { .. } => "dismiss_notification",
        }
    }
}

/// Partial profile update.
///
/// Outer `None` leaves a field untouched; for clearable fields the inner
/// option distinguishes "set" from "clear" (`Some(None)` clears).
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub location: Option<Option<Location>>,
    pub coverage_radius_km: Option<Option<f64>>,
    pub custom_services: Option<Vec<ServiceOffer>>,
    pub vehicle_photo_url: Option<Option<String>>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_start_date: Option<Option<DateTime<Utc>>>,
    pub subscription_end_date: Option<Option<DateTime<Utc>>>,
    pub subscribed_to_customer_id: Option<Option<UserId>>,
    pub subscription_request: Option<SubscriptionSignal>,
    pub subscribed_executor_id: Option<Option<UserId>>,
    pub notifications: Option<Vec<Notification>>,
}

impl ProfilePatch {
    /// Patch that replaces the notification list only.
    pub fn notifications(notifications: Vec<Notification>) -> Self {
        Self {
            notifications: Some(notifications),
            ..Self::default()
        }
    }

    /// Apply this patch to a profile.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            profile.phone = phone.clone();
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = avatar_url.clone();
        }
        if let Some(description) = &self.description {
            profile.description = description.clone();
        }
        if let Some(location) = &self.location {
            profile.location = location.clone();
        }
        if let Some(radius) = &self.coverage_radius_km {
            profile.coverage_radius_km = *radius;
        }
        if let Some(services) = &self.custom_services {
            profile.custom_services = services.clone();
        }
        if let Some(vehicle_photo_url) = &self.vehicle_photo_url {
            profile.vehicle_photo_url = vehicle_photo_url.clone();
        }
        if let Some(status) = self.subscription_status {
            profile.subscription_status = status;
        }
        if let Some(start) = self.subscription_start_date {
            profile.subscription_start_date = start;
        }
        if let Some(end) = self.subscription_end_date {
            profile.subscription_end_date = end;
        }
        if let Some(customer) = &self.subscribed_to_customer_id {
            profile.subscribed_to_customer_id = customer.clone();
        }
        if let Some(signal) = &self.subscription_request {
            profile.subscription_request = signal.clone();
        }
        if let Some(executor) = &self.subscribed_executor_id {
            profile.subscribed_executor_id = executor.clone();
        }
        if let Some(notifications) = &self.notifications {
            profile.notifications = notifications.clone();
        }
    }
}
