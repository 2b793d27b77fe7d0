//! Prometheus metrics for the sync client.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means a duplicate metric name, which is a fatal configuration error that
//! should crash at startup rather than fail silently. These panics only occur
//! during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_gauge_vec, CounterVec, IntGaugeVec};

/// Mutations applied optimistically, by kind.
pub static MUTATIONS_APPLIED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mova_mutations_applied_total",
        "Optimistic mutations applied to the local store",
        &["kind"]
    )
    .unwrap()
});

/// Remote writes that failed after an optimistic apply, by kind.
pub static REMOTE_WRITE_FAILURES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mova_remote_write_failures_total",
        "Remote writes that failed after the optimistic local apply",
        &["kind"]
    )
    .unwrap()
});

/// Realtime change events folded into the store, by event type.
pub static EVENTS_INGESTED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mova_events_ingested_total",
        "Realtime change events folded into the record store",
        &["event"]
    )
    .unwrap()
});

/// Realtime change events dropped by the relevance filter.
pub static EVENTS_DROPPED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mova_events_dropped_total",
        "Realtime change events dropped as irrelevant to the actor",
        &["event"]
    )
    .unwrap()
});

/// Corrections issued by the reconciliation loop, by transition.
pub static RECONCILE_CORRECTIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mova_reconcile_corrections_total",
        "Subscription corrections issued by the reconciliation loop",
        &["transition"]
    )
    .unwrap()
});

/// Notifications appended (deduplicated appends excluded).
pub static NOTIFICATIONS_APPENDED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mova_notifications_appended_total",
        "Notifications appended to the actor's profile",
        &["kind"]
    )
    .unwrap()
});

/// Records currently carrying unconfirmed local intent, by entity/state.
pub static RECORDS_DIVERGED: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "mova_records_diverged",
        "Records whose remote write failed and remain divergent",
        &["entity"]
    )
    .unwrap()
});

/// Static facade used by the other crates.
pub struct Metrics;

impl Metrics {
    pub fn mutation_applied(kind: &str) {
        MUTATIONS_APPLIED.with_label_values(&[kind]).inc();
    }

    pub fn remote_write_failed(kind: &str) {
        REMOTE_WRITE_FAILURES.with_label_values(&[kind]).inc();
    }

    pub fn event_ingested(event: &str) {
        EVENTS_INGESTED.with_label_values(&[event]).inc();
    }

    pub fn event_dropped(event: &str) {
        EVENTS_DROPPED.with_label_values(&[event]).inc();
    }

    pub fn reconcile_correction(transition: &str) {
        RECONCILE_CORRECTIONS.with_label_values(&[transition]).inc();
    }

    pub fn notification_appended(kind: &str) {
        NOTIFICATIONS_APPENDED.with_label_values(&[kind]).inc();
    }

    pub fn record_diverged(entity: &str) {
        RECORDS_DIVERGED.with_label_values(&[entity]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_once() {
        // Touch every metric so duplicate registration would panic here.
        Metrics::mutation_applied("accept_order");
        Metrics::remote_write_failed("accept_order");
        Metrics::event_ingested("insert");
        Metrics::event_dropped("insert");
        Metrics::reconcile_correction("pending_to_active");
        Metrics::notification_appended("warning");
        Metrics::record_diverged("order");
    }
}
