//! Identifier newtypes.
//!
//! Entity ids are opaque strings assigned by the backing store. Locally
//! created records get a `{prefix}_{timestamp_ms}_{uuid_short}` id so they
//! remain unique across sessions before the remote insert confirms.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new locally-unique id.
            ///
            /// Format: `{prefix}_{timestamp_ms}_{uuid_short}`
            pub fn generate() -> Self {
                let ts = chrono::Utc::now().timestamp_millis();
                let uuid_short = &Uuid::new_v4().to_string()[..8];
                Self(format!(concat!($prefix, "_{}_{}"), ts, uuid_short))
            }

            /// Wrap an existing id from the store.
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Order identifier.
    OrderId, "ord"
}

string_id! {
    /// User profile identifier (1:1 with an auth identity).
    UserId, "usr"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_unique() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_prefix() {
        assert!(OrderId::generate().as_str().starts_with("ord_"));
        assert!(UserId::generate().as_str().starts_with("usr_"));
    }

    #[test]
    fn test_id_roundtrip() {
        let id = UserId::from("remote-uuid-123");
        assert_eq!(id.as_str(), "remote-uuid-123");
        assert_eq!(id.to_string(), "remote-uuid-123");
    }
}
