//! User-visible notification records.
//!
//! Notifications are appended by the system on detected state transitions
//! (rejections, cancellations) and removed only by explicit user dismissal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// A user-visible notification.
///
/// The id is the creation timestamp in milliseconds rendered as a string.
/// Collisions are possible but inconsequential: notifications are only ever
/// looked up by id for dismissal from the currently-rendered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    /// Create an unread notification stamped now.
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            date: now,
            read: false,
        }
    }

    /// Age of this notification relative to `now`, in seconds.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.date).num_seconds()
    }
}
