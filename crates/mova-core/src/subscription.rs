//! Subscription status and the wire-level rejection sentinel.
//!
//! The backing schema has no dedicated rejection column; a customer signals
//! rejection by writing `"REJECTED:" + executor_id` into the same column an
//! executor uses for its pending request target. Changing the encoding would
//! need a schema migration, so the sentinel stays on the wire as-is and is
//! decoded into `SubscriptionSignal` at the row boundary. No logic above the
//! adapter ever matches raw strings.

use crate::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire prefix marking a rejection in the shared request column.
pub const REJECTED_PREFIX: &str = "REJECTED:";

/// Subscription lifecycle of an executor profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// No subscription and no pending request.
    #[default]
    None,
    /// Request sent, waiting for the customer to confirm or reject.
    Pending,
    /// Confirmed; symmetric link to a customer is expected.
    Active,
    /// The 30-day term has lapsed.
    Expired,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Decoded content of the shared `subscription_request_to_customer_id` column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubscriptionSignal {
    /// Column is empty.
    #[default]
    None,
    /// Executor side: a pending request targeting this customer.
    Requested(UserId),
    /// Customer side: rejection sentinel naming the rejected executor.
    Rejected(UserId),
}

impl SubscriptionSignal {
    /// Decode the raw column value.
    pub fn decode(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::None,
            Some(value) => match value.strip_prefix(REJECTED_PREFIX) {
                Some(executor_id) => Self::Rejected(UserId::from(executor_id)),
                None => Self::Requested(UserId::from(value)),
            },
        }
    }

    /// Encode back to the raw column value.
    pub fn encode(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Requested(customer_id) => Some(customer_id.to_string()),
            Self::Rejected(executor_id) => Some(format!("{REJECTED_PREFIX}{executor_id}")),
        }
    }

    /// Whether the column is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty() {
        assert_eq!(SubscriptionSignal::decode(None), SubscriptionSignal::None);
        assert_eq!(
            SubscriptionSignal::decode(Some("")),
            SubscriptionSignal::None
        );
    }

    #[test]
    fn test_decode_request() {
        assert_eq!(
            SubscriptionSignal::decode(Some("cust-9")),
            SubscriptionSignal::Requested(UserId::from("cust-9"))
        );
    }

    #[test]
    fn test_decode_rejection_sentinel() {
        assert_eq!(
            SubscriptionSignal::decode(Some("REJECTED:exec-3")),
            SubscriptionSignal::Rejected(UserId::from("exec-3"))
        );
    }

    #[test]
    fn test_encode_roundtrip() {
        for signal in [
            SubscriptionSignal::None,
            SubscriptionSignal::Requested(UserId::from("cust-9")),
            SubscriptionSignal::Rejected(UserId::from("exec-3")),
        ] {
            let raw = signal.encode();
            assert_eq!(SubscriptionSignal::decode(raw.as_deref()), signal);
        }
    }
}
