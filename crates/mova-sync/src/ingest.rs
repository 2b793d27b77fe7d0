//! Realtime change-event ingest.
//!
//! Consumes the orders change stream and folds each event into the record
//! store, in arrival order, deciding relevance per the consuming actor's
//! role. Irrelevant events are dropped, not stored. Out-of-order delivery is
//! not specially handled: the last event wins, same as every other write.

use std::sync::Arc;

use chrono::Utc;
use mova_backend::{ChangeEvent, Session};
use mova_core::{Notification, NotificationKind, Order, OrderStatus, Role};
use mova_store::{RecordStoreHandle, WriteSource};
use mova_telemetry::Metrics;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::mutation::{Mutation, ProfilePatch};
use crate::mutator::OptimisticMutator;
use crate::notify::{append_notification, DedupePolicy};

/// Whether an order event matters to this actor.
///
/// Customer: own orders only. Executor: orders assigned to them, plus every
/// open order. Admin sees everything.
pub fn is_relevant(actor: &Session, order: &Order) -> bool {
    match actor.role {
        Role::Customer => order.customer_id == actor.user_id,
        Role::Executor => {
            order.executor_id.as_ref() == Some(&actor.user_id)
                || order.status == OrderStatus::Open
        }
        Role::Admin => true,
    }
}

/// Folds the realtime order stream into the record store.
pub struct RealtimeIngest {
    actor: Session,
    store: RecordStoreHandle,
    mutator: Arc<OptimisticMutator>,
    rx: mpsc::Receiver<ChangeEvent>,
}

impl RealtimeIngest {
    pub fn new(
        actor: Session,
        store: RecordStoreHandle,
        mutator: Arc<OptimisticMutator>,
        rx: mpsc::Receiver<ChangeEvent>,
    ) -> Self {
        Self {
            actor,
            store,
            mutator,
            rx,
        }
    }

    /// Process events until the stream closes.
    pub async fn run(mut self) {
        debug!(actor = %self.actor.user_id, "RealtimeIngest started");

        while let Some(event) = self.rx.recv().await {
            self.handle_event(event).await;
        }

        debug!("RealtimeIngest stream closed");
    }

    async fn handle_event(&self, event: ChangeEvent) {
        match event {
            ChangeEvent::Inserted(order) => {
                if is_relevant(&self.actor, &order) {
                    Metrics::event_ingested("insert");
                    self.store
                        .upsert_order(order, WriteSource::Authoritative)
                        .await;
                } else {
                    trace!(order = %order.id, "dropping irrelevant insert");
                    Metrics::event_dropped("insert");
                }
            }
            ChangeEvent::Updated(order) => {
                let previous = self.store.get_order(&order.id);
                let known = previous.is_some();
                if known || is_relevant(&self.actor, &order) {
                    Metrics::event_ingested("update");
                    self.notify_rejection(previous.as_ref(), &order).await;
                    self.store
                        .upsert_order(order, WriteSource::Authoritative)
                        .await;
                } else {
                    trace!(order = %order.id, "dropping irrelevant update");
                    Metrics::event_dropped("update");
                }
            }
            ChangeEvent::Deleted(id) => {
                // Unconditional: a delete for an unknown id is a no-op.
                Metrics::event_ingested("delete");
                self.store.remove_order(id).await;
            }
        }
    }

    /// Append a warning when the actor's own order just reopened with a
    /// rejection reason. Deduplicated by exact message, so replays of the
    /// same event cannot stack entries.
    async fn notify_rejection(&self, previous: Option<&Order>, order: &Order) {
        if self.actor.role != Role::Customer || order.customer_id != self.actor.user_id {
            return;
        }
        let reason = match order.rejection_reason.as_deref() {
            Some(reason) if !reason.is_empty() => reason,
            _ => return,
        };
        if order.status != OrderStatus::Open {
            return;
        }
        let newly_rejected = previous.map_or(true, |old| {
            old.status != OrderStatus::Open
                || old.rejection_reason.as_deref() != Some(reason)
        });
        if !newly_rejected {
            return;
        }

        let Some(profile) = self.store.get_profile(&self.actor.user_id) else {
            // Own profile not loaded yet; the reason stays on the order row.
            return;
        };

        let message = format!("Order rejected, reason: {reason}");
        let notification = Notification::new(NotificationKind::Warning, "Order rejected", message);
        let (notifications, appended) = append_notification(
            &profile.notifications,
            notification,
            DedupePolicy::ExactMessage,
            Utc::now(),
        );
        if !appended {
            return;
        }
        Metrics::notification_appended("warning");

        if let Err(error) = self
            .mutator
            .apply(Mutation::UpdateProfile {
                patch: ProfilePatch::notifications(notifications),
            })
            .await
        {
            warn!(%error, "failed to persist rejection notification");
        }
    }
}
