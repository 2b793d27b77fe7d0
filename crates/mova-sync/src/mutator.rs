//! Optimistic mutation application.
//!
//! `apply` validates, transforms the local copy, enqueues it on the record
//! store, and only then issues the remote write, fire-and-forget. The UI
//! path never waits on the network. A failed remote write is logged and the
//! record is marked `Diverged`; it is NOT rolled back. The divergence lasts
//! until the next authoritative read (realtime event or refetch) overwrites
//! the record.

use std::sync::Arc;

use chrono::Utc;
use mova_core::{
    validate_rating, Notification, NotificationKind, Order, OrderId, OrderStatus, Review, Role,
    SubscriptionSignal, SubscriptionStatus, UserId, UserProfile,
};
use mova_backend::{DataStore, Session};
use mova_store::{RecordStoreHandle, WriteSource};
use mova_telemetry::Metrics;
use tracing::{debug, warn};

use crate::error::{MutationError, MutationResult};
use crate::mutation::Mutation;

/// One record write produced by a mutation transform.
///
/// The same plan drives both sides: the local enqueue (synchronous, before
/// any network) and the remote write (spawned, best effort).
#[derive(Debug, Clone)]
enum Write {
    PutOrder(Order),
    DropOrder(OrderId),
    PutProfile(UserProfile),
}

/// Applies mutations optimistically and mirrors them to the remote store.
pub struct OptimisticMutator {
    actor: Session,
    store: RecordStoreHandle,
    remote: Arc<dyn DataStore>,
}

impl OptimisticMutator {
    pub fn new(actor: Session, store: RecordStoreHandle, remote: Arc<dyn DataStore>) -> Self {
        Self {
            actor,
            store,
            remote,
        }
    }

    /// The actor this mutator acts as.
    pub fn actor(&self) -> &Session {
        &self.actor
    }

    /// Apply a mutation: validate, transform locally, then write remotely.
    ///
    /// Returns synchronously surfaced validation errors only; remote failures
    /// never reach the caller.
    pub async fn apply(&self, mutation: Mutation) -> MutationResult<()> {
        let kind = mutation.kind();
        let writes = self.plan(&mutation)?;

        for write in &writes {
            match write {
                Write::PutOrder(order) => {
                    self.store
                        .upsert_order(order.clone(), WriteSource::Local)
                        .await;
                }
                Write::DropOrder(id) => {
                    self.store.remove_order(id.clone()).await;
                }
                Write::PutProfile(profile) => {
                    self.store
                        .upsert_profile(profile.clone(), WriteSource::Local)
                        .await;
                }
            }
        }

        Metrics::mutation_applied(kind);
        debug!(kind, actor = %self.actor.user_id, "mutation applied locally");

        self.spawn_remote(kind, writes);
        Ok(())
    }

    /// Submit a freshly created order.
    ///
    /// Creation sits outside the closed mutation set (it starts a record
    /// rather than transforming one) but follows the same optimistic path.
    pub async fn submit_order(&self, order: Order) -> MutationResult<()> {
        self.require_role(Role::Customer)?;
        if order.customer_id != self.actor.user_id {
            return Err(MutationError::Validation(
                "order must belong to the submitting customer".to_string(),
            ));
        }
        order
            .check_invariants()
            .map_err(|e| MutationError::Validation(e.to_string()))?;

        self.store
            .upsert_order(order.clone(), WriteSource::Local)
            .await;
        Metrics::mutation_applied("submit_order");

        let remote = self.remote.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(error) = remote.insert_order(&order).await {
                warn!(order = %order.id, %error, "remote insert failed, local state diverged");
                Metrics::remote_write_failed("submit_order");
                Metrics::record_diverged("order");
                store.mark_order_diverged(order.id.clone()).await;
            }
        });
        Ok(())
    }

    // ========================================================================
    // Planning (validation + transforms)
    // ========================================================================

    fn plan(&self, mutation: &Mutation) -> MutationResult<Vec<Write>> {
        match mutation {
            Mutation::AcceptOrder { order_id } => self.plan_accept(order_id),
            Mutation::RejectOrder { order_id, reason } => self.plan_reject(order_id, reason),
            Mutation::ClaimOpenOrder { order_id } => self.plan_claim(order_id),
            Mutation::RespondToOpenOrder { order_id } => self.plan_respond(order_id),
            Mutation::SelectExecutor {
                order_id,
                executor_id,
            } => self.plan_select(order_id, executor_id),
            Mutation::CompleteOrder {
                order_id,
                rating,
                review,
            } => self.plan_complete(order_id, *rating, review.as_deref()),
            Mutation::CancelOrder { order_id } => self.plan_cancel(order_id),
            Mutation::DeleteOrder { order_id } => self.plan_delete(order_id),
            Mutation::RequestSubscription { customer_id } => {
                self.plan_request_subscription(customer_id)
            }
            Mutation::ConfirmSubscription { executor_id } => {
                self.plan_confirm_subscription(executor_id)
            }
            Mutation::RejectSubscription { executor_id } => {
                self.plan_reject_subscription(executor_id)
            }
            Mutation::CancelSubscription { reason } => {
                self.plan_cancel_subscription(reason.as_deref())
            }
            Mutation::UpdateProfile { patch } => {
                let mut profile = self.self_profile()?;
                patch.apply_to(&mut profile);
                Ok(vec![Write::PutProfile(profile)])
            }
            Mutation::DismissNotification { notification_id } => {
                let mut profile = self.self_profile()?;
                profile.notifications.retain(|n| n.id != *notification_id);
                Ok(vec![Write::PutProfile(profile)])
            }
        }
    }

    fn plan_accept(&self, order_id: &OrderId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Executor)?;
        let mut order = self.order(order_id)?;
        if order.executor_id.as_ref() != Some(&self.actor.user_id) {
            return Err(MutationError::Validation(
                "order is not assigned to this executor".to_string(),
            ));
        }
        if order.status != OrderStatus::Pending {
            return Err(MutationError::Validation(format!(
                "cannot accept order in status {}",
                order.status
            )));
        }
        order.status = OrderStatus::Confirmed;
        Ok(vec![Write::PutOrder(order)])
    }

    fn plan_reject(&self, order_id: &OrderId, reason: &str) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Executor)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(MutationError::Validation(
                "rejection reason must not be empty".to_string(),
            ));
        }
        let mut order = self.order(order_id)?;
        // Fixed transform: the order reopens unconditionally.
        // `allow_open_selection` only gates creation, never the reject path.
        order.status = OrderStatus::Open;
        order.executor_id = None;
        order.responses.clear();
        order.rejection_reason = Some(reason.to_string());
        Ok(vec![Write::PutOrder(order)])
    }

    fn plan_claim(&self, order_id: &OrderId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Executor)?;
        let mut order = self.order(order_id)?;
        if !order.is_open() {
            return Err(MutationError::Validation(
                "only open orders can be claimed".to_string(),
            ));
        }
        order.executor_id = Some(self.actor.user_id.clone());
        order.status = OrderStatus::Confirmed;
        order.responses.clear();
        Ok(vec![Write::PutOrder(order)])
    }

    fn plan_respond(&self, order_id: &OrderId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Executor)?;
        let mut order = self.order(order_id)?;
        if !order.is_open() {
            return Err(MutationError::Validation(
                "only open orders accept responses".to_string(),
            ));
        }
        if order.customer_id == self.actor.user_id {
            return Err(MutationError::Validation(
                "cannot respond to own order".to_string(),
            ));
        }
        if order.responses.contains(&self.actor.user_id) {
            return Err(MutationError::Validation(
                "already responded to this order".to_string(),
            ));
        }
        order.responses.push(self.actor.user_id.clone());
        Ok(vec![Write::PutOrder(order)])
    }

    fn plan_select(&self, order_id: &OrderId, executor_id: &UserId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Customer)?;
        let mut order = self.own_order(order_id)?;
        if !order.is_open() {
            return Err(MutationError::Validation(
                "executor can only be selected on an open order".to_string(),
            ));
        }
        if !order.responses.contains(executor_id) {
            return Err(MutationError::Validation(
                "executor has not responded to this order".to_string(),
            ));
        }
        order.executor_id = Some(executor_id.clone());
        order.status = OrderStatus::Confirmed;
        order.responses.clear();
        Ok(vec![Write::PutOrder(order)])
    }

    fn plan_complete(
        &self,
        order_id: &OrderId,
        rating: u8,
        review: Option<&str>,
    ) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Customer)?;
        let rating =
            validate_rating(rating).map_err(|e| MutationError::Validation(e.to_string()))?;
        let mut order = self.own_order(order_id)?;
        if order.status != OrderStatus::Confirmed {
            return Err(MutationError::Validation(format!(
                "cannot complete order in status {}",
                order.status
            )));
        }
        order.status = OrderStatus::Completed;
        order.rating = Some(rating);
        order.review = review.map(ToString::to_string);

        let mut writes = vec![Write::PutOrder(order.clone())];

        // Attach the review to the executor profile and recompute its mean.
        // Two rows, no transaction: same weak guarantee as subscriptions.
        if let Some(executor_id) = &order.executor_id {
            if let Some(mut executor) = self.store.get_profile(executor_id) {
                let author_name = self
                    .store
                    .get_profile(&self.actor.user_id)
                    .map(|p| p.name)
                    .unwrap_or_default();
                executor.apply_review(Review {
                    id: Utc::now().timestamp_millis().to_string(),
                    author_id: self.actor.user_id.clone(),
                    author_name,
                    rating,
                    text: review.unwrap_or_default().to_string(),
                    date: Utc::now(),
                });
                writes.push(Write::PutProfile(executor));
            }
        }
        Ok(writes)
    }

    fn plan_cancel(&self, order_id: &OrderId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Customer)?;
        let mut order = self.own_order(order_id)?;
        if order.is_terminal() {
            return Err(MutationError::Validation(
                "order is already terminal".to_string(),
            ));
        }
        order.status = OrderStatus::Cancelled;
        Ok(vec![Write::PutOrder(order)])
    }

    fn plan_delete(&self, order_id: &OrderId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Customer)?;
        let order = self.own_order(order_id)?;
        if !order.is_terminal() {
            return Err(MutationError::Validation(
                "only terminal orders can be deleted".to_string(),
            ));
        }
        Ok(vec![Write::DropOrder(order.id)])
    }

    fn plan_request_subscription(&self, customer_id: &UserId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Executor)?;
        let mut profile = self.self_profile()?;
        match profile.subscription_status {
            SubscriptionStatus::None | SubscriptionStatus::Expired => {}
            status => {
                return Err(MutationError::Validation(format!(
                    "subscription is already {status}"
                )));
            }
        }
        profile.subscription_status = SubscriptionStatus::Pending;
        profile.subscription_request = SubscriptionSignal::Requested(customer_id.clone());
        Ok(vec![Write::PutProfile(profile)])
    }

    fn plan_confirm_subscription(&self, executor_id: &UserId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Customer)?;
        let mut profile = self.self_profile()?;
        profile.subscribed_executor_id = Some(executor_id.clone());
        Ok(vec![Write::PutProfile(profile)])
    }

    fn plan_reject_subscription(&self, executor_id: &UserId) -> MutationResult<Vec<Write>> {
        self.require_role(Role::Customer)?;
        let mut profile = self.self_profile()?;
        // The schema has no rejection column; the sentinel rides the shared
        // request field and the executor's reconciliation decodes it.
        profile.subscription_request = SubscriptionSignal::Rejected(executor_id.clone());
        Ok(vec![Write::PutProfile(profile)])
    }

    fn plan_cancel_subscription(&self, reason: Option<&str>) -> MutationResult<Vec<Write>> {
        let mut profile = self.self_profile()?;
        match self.actor.role {
            Role::Customer => {
                profile.subscribed_executor_id = None;
            }
            Role::Executor => {
                profile.subscription_status = SubscriptionStatus::None;
                profile.subscription_start_date = None;
                profile.subscription_end_date = None;
                profile.subscribed_to_customer_id = None;
                profile.subscription_request = SubscriptionSignal::None;
            }
            Role::Admin => {
                return Err(MutationError::WrongRole {
                    required: "customer or executor",
                    actual: Role::Admin,
                });
            }
        }

        // The counterpart has no channel for the reason; it learns about the
        // cancellation from its own reconciliation pass. The reason stays on
        // the canceller's side.
        let message = match reason {
            Some(reason) => format!("Subscription cancelled: {reason}"),
            None => "Subscription cancelled".to_string(),
        };
        profile
            .notifications
            .push(Notification::new(NotificationKind::Info, "Subscription", message));
        Metrics::notification_appended("info");

        Ok(vec![Write::PutProfile(profile)])
    }

    // ========================================================================
    // Remote side
    // ========================================================================

    /// Issue the remote writes for an applied plan.
    ///
    /// Failures mark the record diverged; there is no retry and no rollback.
    /// The next authoritative read is the only thing that repairs the record.
    fn spawn_remote(&self, kind: &'static str, writes: Vec<Write>) {
        let remote = self.remote.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            for write in writes {
                match write {
                    Write::PutOrder(order) => {
                        if let Err(error) = remote.update_order(&order).await {
                            warn!(kind, order = %order.id, %error, "remote write failed, local state diverged");
                            Metrics::remote_write_failed(kind);
                            Metrics::record_diverged("order");
                            store.mark_order_diverged(order.id).await;
                        }
                    }
                    Write::DropOrder(id) => {
                        if let Err(error) = remote.delete_order(&id).await {
                            warn!(kind, order = %id, %error, "remote delete failed");
                            Metrics::remote_write_failed(kind);
                        }
                    }
                    Write::PutProfile(profile) => {
                        if let Err(error) = remote.update_profile(&profile).await {
                            warn!(kind, profile = %profile.id, %error, "remote write failed, local state diverged");
                            Metrics::remote_write_failed(kind);
                            Metrics::record_diverged("profile");
                            store.mark_profile_diverged(profile.id).await;
                        }
                    }
                }
            }
        });
    }

    // ========================================================================
    // Lookups and role checks
    // ========================================================================

    fn order(&self, id: &OrderId) -> MutationResult<Order> {
        self.store
            .get_order(id)
            .ok_or_else(|| MutationError::MissingOrder(id.clone()))
    }

    /// Look up an order and check the actor owns it.
    fn own_order(&self, id: &OrderId) -> MutationResult<Order> {
        let order = self.order(id)?;
        if order.customer_id != self.actor.user_id {
            return Err(MutationError::Validation(
                "order belongs to another customer".to_string(),
            ));
        }
        Ok(order)
    }

    fn self_profile(&self) -> MutationResult<UserProfile> {
        self.store
            .get_profile(&self.actor.user_id)
            .ok_or_else(|| MutationError::MissingProfile(self.actor.user_id.clone()))
    }

    fn require_role(&self, required: Role) -> MutationResult<()> {
        if self.actor.role == required {
            Ok(())
        } else {
            Err(MutationError::WrongRole {
                required: match required {
                    Role::Customer => "customer",
                    Role::Executor => "executor",
                    Role::Admin => "admin",
                },
                actual: self.actor.role,
            })
        }
    }
}
