//! Row types for the two entity tables.
//!
//! Columns are snake_case on the wire. Mapping to entities happens here and
//! nowhere else; in particular the subscription rejection sentinel is decoded
//! into `SubscriptionSignal` on read so the core never touches raw strings.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mova_core::{
    Location, Notification, Order, OrderId, OrderLocation, OrderStatus, Review, Role, ServiceKind,
    ServiceOffer, SubscriptionSignal, SubscriptionStatus, UserId, UserProfile,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, BackendResult};
use crate::schema::{IdColumn, SchemaAdapter};

/// Orders table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: String,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<String>,
    pub service_type: ServiceKind,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: OrderStatus,
    pub total_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub allow_open_selection: bool,
    #[serde(default)]
    pub responses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_message_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    // Exactly one location shape is populated, matching service_type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_from: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_to: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_location: Option<Location>,
}

impl OrderRow {
    /// Encode an entity for the wire.
    pub fn from_entity(order: &Order) -> Self {
        let (location_from, location_to, general_location) = match &order.location {
            OrderLocation::Route { from, to } => (Some(from.clone()), Some(to.clone()), None),
            OrderLocation::Area { general } => (None, None, Some(general.clone())),
        };
        Self {
            id: order.id.to_string(),
            customer_id: order.customer_id.to_string(),
            executor_id: order.executor_id.as_ref().map(ToString::to_string),
            service_type: order.service,
            date: order.date,
            time: order.time,
            status: order.status,
            total_price: order.total_price,
            details: order.details.clone(),
            rejection_reason: order.rejection_reason.clone(),
            allow_open_selection: order.allow_open_selection,
            responses: order.responses.iter().map(ToString::to_string).collect(),
            voice_message_url: order.voice_message_url.clone(),
            rating: order.rating,
            review: order.review.clone(),
            location_from,
            location_to,
            general_location,
        }
    }

    /// Decode a row into an entity.
    pub fn into_entity(self) -> BackendResult<Order> {
        let location = match (self.location_from, self.location_to, self.general_location) {
            (Some(from), Some(to), None) => OrderLocation::Route { from, to },
            (None, None, Some(general)) => OrderLocation::Area { general },
            _ => {
                return Err(BackendError::InvalidRow(format!(
                    "order {} has inconsistent location columns",
                    self.id
                )))
            }
        };
        Ok(Order {
            id: OrderId::from_string(self.id),
            customer_id: UserId::from_string(self.customer_id),
            executor_id: self.executor_id.map(UserId::from_string),
            service: self.service_type,
            date: self.date,
            time: self.time,
            status: self.status,
            total_price: self.total_price,
            details: self.details,
            rejection_reason: self.rejection_reason,
            allow_open_selection: self.allow_open_selection,
            responses: self.responses.into_iter().map(UserId::from_string).collect(),
            voice_message_url: self.voice_message_url,
            rating: self.rating,
            review: self.review,
            location,
        })
    }
}

/// Profiles table row.
///
/// Carries both candidate id columns; [`SchemaAdapter`] decides which one is
/// authoritative for the deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub role: Role,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_radius_km: Option<f64>,
    #[serde(default)]
    pub custom_services: Vec<ServiceOffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_photo_url: Option<String>,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub reviews_count: u32,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed_to_customer_id: Option<String>,
    /// Shared request/rejection column; raw sentinel encoding on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_request_to_customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed_executor_id: Option<String>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl ProfileRow {
    /// Encode an entity for the wire, writing the configured id column.
    pub fn from_entity(profile: &UserProfile, schema: &SchemaAdapter) -> Self {
        let (id, user_id) = match schema.profile_id_column {
            IdColumn::Id => (Some(profile.id.to_string()), None),
            IdColumn::UserId => (None, Some(profile.id.to_string())),
        };
        Self {
            id,
            user_id,
            role: profile.role,
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            avatar_url: profile.avatar_url.clone(),
            description: profile.description.clone(),
            location: profile.location.clone(),
            coverage_radius_km: profile.coverage_radius_km,
            custom_services: profile.custom_services.clone(),
            vehicle_photo_url: profile.vehicle_photo_url.clone(),
            rating: profile.rating,
            reviews_count: profile.reviews_count,
            reviews: profile.reviews.clone(),
            subscription_status: profile.subscription_status,
            subscription_start_date: profile.subscription_start_date,
            subscription_end_date: profile.subscription_end_date,
            subscribed_to_customer_id: profile
                .subscribed_to_customer_id
                .as_ref()
                .map(ToString::to_string),
            subscription_request_to_customer_id: profile.subscription_request.encode(),
            subscribed_executor_id: profile
                .subscribed_executor_id
                .as_ref()
                .map(ToString::to_string),
            notifications: profile.notifications.clone(),
        }
    }

    /// Decode a row into an entity, reading the configured id column.
    ///
    /// Falls back to the other column when the configured one is absent, so a
    /// mid-migration store keeps working.
    pub fn into_entity(self, schema: &SchemaAdapter) -> BackendResult<UserProfile> {
        let id = match schema.profile_id_column {
            IdColumn::Id => self.id.or(self.user_id),
            IdColumn::UserId => self.user_id.or(self.id),
        }
        .ok_or(BackendError::MissingColumn("id/user_id"))?;

        Ok(UserProfile {
            id: UserId::from_string(id),
            role: self.role,
            name: self.name,
            phone: self.phone,
            avatar_url: self.avatar_url,
            description: self.description,
            location: self.location,
            coverage_radius_km: self.coverage_radius_km,
            custom_services: self.custom_services,
            vehicle_photo_url: self.vehicle_photo_url,
            rating: self.rating,
            reviews_count: self.reviews_count,
            reviews: self.reviews,
            subscription_status: self.subscription_status,
            subscription_start_date: self.subscription_start_date,
            subscription_end_date: self.subscription_end_date,
            subscribed_to_customer_id: self.subscribed_to_customer_id.map(UserId::from_string),
            subscription_request: SubscriptionSignal::decode(
                self.subscription_request_to_customer_id.as_deref(),
            ),
            subscribed_executor_id: self.subscribed_executor_id.map(UserId::from_string),
            notifications: self.notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mova_core::OrderLocation;
    use rust_decimal_macros::dec;

    fn sample_order() -> Order {
        Order::new(
            UserId::from("cust-1"),
            None,
            ServiceKind::Accompaniment,
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            dec!(45.00),
            OrderLocation::Area {
                general: Location::from_address("Downtown"),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_order_row_roundtrip() {
        let order = sample_order();
        let row = OrderRow::from_entity(&order);
        assert_eq!(row.general_location.as_ref().unwrap().address, "Downtown");
        assert!(row.location_from.is_none());

        let back = row.into_entity().unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_order_row_rejects_mixed_location_columns() {
        let mut row = OrderRow::from_entity(&sample_order());
        row.location_from = Some(Location::from_address("1 Main St"));
        assert!(row.into_entity().is_err());
    }

    #[test]
    fn test_profile_row_sentinel_decode() {
        let schema = SchemaAdapter::default();
        let mut profile = UserProfile::new(UserId::from("cust-1"), Role::Customer, "Sam");
        profile.subscription_request = SubscriptionSignal::Rejected(UserId::from("exec-3"));

        let row = ProfileRow::from_entity(&profile, &schema);
        assert_eq!(
            row.subscription_request_to_customer_id.as_deref(),
            Some("REJECTED:exec-3")
        );

        let back = row.into_entity(&schema).unwrap();
        assert_eq!(
            back.subscription_request,
            SubscriptionSignal::Rejected(UserId::from("exec-3"))
        );
    }

    #[test]
    fn test_profile_row_id_column_selection() {
        let profile = UserProfile::new(UserId::from("u-1"), Role::Executor, "Dana");

        let schema = SchemaAdapter {
            profile_id_column: IdColumn::UserId,
        };
        let row = ProfileRow::from_entity(&profile, &schema);
        assert!(row.id.is_none());
        assert_eq!(row.user_id.as_deref(), Some("u-1"));

        let back = row.into_entity(&schema).unwrap();
        assert_eq!(back.id, UserId::from("u-1"));
    }

    #[test]
    fn test_profile_row_id_fallback_across_columns() {
        let schema = SchemaAdapter {
            profile_id_column: IdColumn::UserId,
        };
        // Row from a deployment still writing `id`.
        let row = ProfileRow::from_entity(
            &UserProfile::new(UserId::from("u-2"), Role::Customer, "Kim"),
            &SchemaAdapter::default(),
        );
        let back = row.into_entity(&schema).unwrap();
        assert_eq!(back.id, UserId::from("u-2"));
    }
}
