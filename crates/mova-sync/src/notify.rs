//! Notification append with call-site-specific deduplication.
//!
//! A pure function over the current list: the caller picks the dedupe policy
//! (exact message match for rejection notices, title + message within a time
//! window for subscription-cancel notices, which fire repeatedly from the
//! reconciliation loop until the correction is durably saved).

use chrono::{DateTime, Duration, Utc};
use mova_core::Notification;

/// How to decide whether a notification is already represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupePolicy {
    /// Duplicate iff an existing entry has the exact same message.
    ExactMessage,
    /// Duplicate iff an existing entry has the same title and message and is
    /// younger than the window.
    TitleAndRecentMessage { window_seconds: i64 },
}

/// Append `new` to `current` unless the policy marks it a duplicate.
///
/// Returns the (possibly unchanged) list and whether an append happened.
pub fn append_notification(
    current: &[Notification],
    new: Notification,
    policy: DedupePolicy,
    now: DateTime<Utc>,
) -> (Vec<Notification>, bool) {
    let duplicate = current.iter().any(|existing| match policy {
        DedupePolicy::ExactMessage => existing.message == new.message,
        DedupePolicy::TitleAndRecentMessage { window_seconds } => {
            existing.title == new.title
                && existing.message == new.message
                && now - existing.date <= Duration::seconds(window_seconds)
        }
    });

    if duplicate {
        return (current.to_vec(), false);
    }

    let mut next = current.to_vec();
    next.push(new);
    (next, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mova_core::NotificationKind;

    fn rejection(message: &str) -> Notification {
        Notification::new(NotificationKind::Warning, "Order rejected", message)
    }

    #[test]
    fn test_exact_message_dedupe() {
        let first = rejection("reason: busy");
        let (list, appended) =
            append_notification(&[], first.clone(), DedupePolicy::ExactMessage, Utc::now());
        assert!(appended);
        assert_eq!(list.len(), 1);

        // Byte-identical message within the same session: exactly one entry.
        let (list, appended) = append_notification(
            &list,
            rejection("reason: busy"),
            DedupePolicy::ExactMessage,
            Utc::now(),
        );
        assert!(!appended);
        assert_eq!(list.len(), 1);

        let (list, appended) = append_notification(
            &list,
            rejection("reason: too far"),
            DedupePolicy::ExactMessage,
            Utc::now(),
        );
        assert!(appended);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_window_dedupe_suppresses_recent() {
        let existing = rejection("subscription cancelled");
        let now = existing.date + Duration::seconds(30);

        let (list, appended) = append_notification(
            std::slice::from_ref(&existing),
            rejection("subscription cancelled"),
            DedupePolicy::TitleAndRecentMessage { window_seconds: 60 },
            now,
        );
        assert!(!appended);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_window_dedupe_allows_after_window() {
        let existing = rejection("subscription cancelled");
        let now = existing.date + Duration::seconds(90);

        let (list, appended) = append_notification(
            std::slice::from_ref(&existing),
            rejection("subscription cancelled"),
            DedupePolicy::TitleAndRecentMessage { window_seconds: 60 },
            now,
        );
        assert!(appended);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_window_dedupe_distinguishes_titles() {
        let existing = Notification::new(NotificationKind::Warning, "Other title", "same message");
        let now = existing.date;

        let (_, appended) = append_notification(
            &[existing],
            rejection("same message"),
            DedupePolicy::TitleAndRecentMessage { window_seconds: 60 },
            now,
        );
        assert!(appended);
    }
}
