//! The reconciliation loop.
//!
//! Runs on a fixed interval AND immediately whenever the local actor's
//! profile or the counterpart roster changes (the record store fires the
//! trigger channel). Each tick is idempotent: re-running it against an
//! already-consistent snapshot issues no corrections, which bounds the damage
//! from its own corrections racing fresh remote state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mova_backend::{DataStore, Session};
use mova_core::{
    Notification, NotificationKind, Role, SubscriptionSignal, SubscriptionStatus, UserId,
    UserProfile,
};
use mova_store::RecordStoreHandle;
use mova_sync::{append_notification, DedupePolicy, Mutation, OptimisticMutator, ProfilePatch};
use mova_telemetry::Metrics;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Reconciliation loop configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReconcileConfig {
    /// Whether the loop runs at all. Default: true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Tick interval (seconds). Default: 30.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Subscription term stamped on activation (days). Default: 30.
    #[serde(default = "default_term_days")]
    pub subscription_term_days: i64,
    /// Dedupe window for repeated cancellation notices (seconds). Default: 60.
    #[serde(default = "default_cancel_window_seconds")]
    pub cancel_notice_window_seconds: i64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    30
}

fn default_term_days() -> i64 {
    30
}

fn default_cancel_window_seconds() -> i64 {
    60
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval_secs(),
            subscription_term_days: default_term_days(),
            cancel_notice_window_seconds: default_cancel_window_seconds(),
        }
    }
}

/// Detects and heals divergent subscription state for an executor actor.
pub struct ReconcileLoop {
    config: ReconcileConfig,
    actor: Session,
    store: RecordStoreHandle,
    remote: Arc<dyn DataStore>,
    mutator: Arc<OptimisticMutator>,
    trigger_rx: mpsc::Receiver<()>,
}

impl ReconcileLoop {
    pub fn new(
        config: ReconcileConfig,
        actor: Session,
        store: RecordStoreHandle,
        remote: Arc<dyn DataStore>,
        mutator: Arc<OptimisticMutator>,
        trigger_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            config,
            actor,
            store,
            remote,
            mutator,
            trigger_rx,
        }
    }

    /// Run until the trigger channel closes (store shutdown).
    pub async fn run(mut self) {
        info!(
            interval_secs = self.config.interval_secs,
            actor = %self.actor.user_id,
            "ReconcileLoop started"
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                triggered = self.trigger_rx.recv() => {
                    if triggered.is_none() {
                        debug!("reconcile trigger closed, stopping");
                        break;
                    }
                }
            }
            if self.config.enabled {
                self.tick().await;
            }
        }
    }

    /// One reconciliation pass.
    ///
    /// Only the executor's own row is corrected; the customer side needs no
    /// healing (its single field is written directly by the customer).
    pub async fn tick(&self) {
        if self.actor.role != Role::Executor {
            return;
        }
        let Some(profile) = self.store.get_profile(&self.actor.user_id) else {
            debug!("own profile not loaded, skipping tick");
            return;
        };

        match profile.subscription_status {
            SubscriptionStatus::Pending => self.check_pending(&profile).await,
            SubscriptionStatus::Active => self.check_active(&profile).await,
            SubscriptionStatus::None | SubscriptionStatus::Expired => {}
        }
    }

    /// Pending: the customer may have confirmed or rejected since we asked.
    async fn check_pending(&self, profile: &UserProfile) {
        let SubscriptionSignal::Requested(customer_id) = &profile.subscription_request else {
            return;
        };
        let Some(customer) = self.fetch_counterpart(customer_id).await else {
            return;
        };

        if customer.subscribed_executor_id.as_ref() == Some(&self.actor.user_id) {
            // Confirmed: activate and stamp the term.
            let now = Utc::now();
            let end = now + chrono::Duration::days(self.config.subscription_term_days);
            info!(customer = %customer_id, "subscription confirmed, activating");
            Metrics::reconcile_correction("pending_to_active");
            self.correct(ProfilePatch {
                subscription_status: Some(SubscriptionStatus::Active),
                subscription_start_date: Some(Some(now)),
                subscription_end_date: Some(Some(end)),
                subscribed_to_customer_id: Some(Some(customer_id.clone())),
                subscription_request: Some(SubscriptionSignal::None),
                ..ProfilePatch::default()
            })
            .await;
        } else if customer.subscription_request
            == SubscriptionSignal::Rejected(self.actor.user_id.clone())
        {
            info!(customer = %customer_id, "subscription request rejected");
            Metrics::reconcile_correction("pending_rejected");
            self.correct(ProfilePatch {
                subscription_status: Some(SubscriptionStatus::None),
                subscription_request: Some(SubscriptionSignal::None),
                ..ProfilePatch::default()
            })
            .await;
        }
    }

    /// Active: the customer may have cancelled or subscribed elsewhere, or
    /// the term may have lapsed.
    async fn check_active(&self, profile: &UserProfile) {
        let Some(customer_id) = &profile.subscribed_to_customer_id else {
            return;
        };
        let Some(customer) = self.fetch_counterpart(customer_id).await else {
            return;
        };

        if customer.subscribed_executor_id.as_ref() != Some(&self.actor.user_id) {
            info!(customer = %customer_id, "subscription asymmetry detected, clearing");
            Metrics::reconcile_correction("active_cancelled");

            let notification = Notification::new(
                NotificationKind::Warning,
                "Subscription",
                "Your subscription was cancelled by the customer",
            );
            // Repeated ticks before the correction durably saves must not
            // stack entries; the window dedupe absorbs them.
            let (notifications, appended) = append_notification(
                &profile.notifications,
                notification,
                DedupePolicy::TitleAndRecentMessage {
                    window_seconds: self.config.cancel_notice_window_seconds,
                },
                Utc::now(),
            );
            if appended {
                Metrics::notification_appended("warning");
            }

            self.correct(ProfilePatch {
                subscription_status: Some(SubscriptionStatus::None),
                subscription_start_date: Some(None),
                subscription_end_date: Some(None),
                subscribed_to_customer_id: Some(None),
                notifications: Some(notifications),
                ..ProfilePatch::default()
            })
            .await;
            return;
        }

        if let Some(end) = profile.subscription_end_date {
            if end < Utc::now() {
                info!(customer = %customer_id, "subscription term lapsed");
                Metrics::reconcile_correction("active_expired");
                self.correct(ProfilePatch {
                    subscription_status: Some(SubscriptionStatus::Expired),
                    ..ProfilePatch::default()
                })
                .await;
            }
        }
    }

    /// Freshly fetch the counterpart row.
    ///
    /// A missing or unreadable counterpart skips this tick's correction; the
    /// next tick retries against whatever state exists then.
    async fn fetch_counterpart(&self, customer_id: &UserId) -> Option<UserProfile> {
        match self.remote.fetch_profile(customer_id).await {
            Ok(Some(customer)) => Some(customer),
            Ok(None) => {
                debug!(customer = %customer_id, "counterpart missing, skipping correction");
                None
            }
            Err(error) => {
                warn!(customer = %customer_id, %error, "counterpart fetch failed, skipping correction");
                None
            }
        }
    }

    /// Issue a correction through the normal optimistic path.
    async fn correct(&self, patch: ProfilePatch) {
        if let Err(error) = self.mutator.apply(Mutation::UpdateProfile { patch }).await {
            warn!(%error, "reconcile correction rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mova_backend::MemoryDataStore;
    use mova_store::{spawn_record_store, WriteSource};

    struct Fixture {
        remote: Arc<MemoryDataStore>,
        store: RecordStoreHandle,
        reconciler: ReconcileLoop,
    }

    fn executor_session() -> Session {
        Session {
            user_id: UserId::from("exec-1"),
            role: Role::Executor,
        }
    }

    fn fixture() -> Fixture {
        let remote = Arc::new(MemoryDataStore::new());
        let (store, _join) = spawn_record_store(64, None);
        let mutator = Arc::new(OptimisticMutator::new(
            executor_session(),
            store.clone(),
            remote.clone() as Arc<dyn DataStore>,
        ));
        let (_trigger_tx, trigger_rx) = mpsc::channel(1);
        let reconciler = ReconcileLoop::new(
            ReconcileConfig::default(),
            executor_session(),
            store.clone(),
            remote.clone() as Arc<dyn DataStore>,
            mutator,
            trigger_rx,
        );
        Fixture {
            remote,
            store,
            reconciler,
        }
    }

    fn pending_executor(customer: &str) -> UserProfile {
        let mut profile = UserProfile::new(UserId::from("exec-1"), Role::Executor, "Dana");
        profile.subscription_status = SubscriptionStatus::Pending;
        profile.subscription_request = SubscriptionSignal::Requested(UserId::from(customer));
        profile
    }

    fn active_executor(customer: &str) -> UserProfile {
        let now = Utc::now();
        let mut profile = UserProfile::new(UserId::from("exec-1"), Role::Executor, "Dana");
        profile.subscription_status = SubscriptionStatus::Active;
        profile.subscription_start_date = Some(now);
        profile.subscription_end_date = Some(now + chrono::Duration::days(30));
        profile.subscribed_to_customer_id = Some(UserId::from(customer));
        profile
    }

    fn customer_profile(id: &str, subscribed_executor: Option<&str>) -> UserProfile {
        let mut profile = UserProfile::new(UserId::from(id), Role::Customer, "Sam");
        profile.subscribed_executor_id = subscribed_executor.map(UserId::from);
        profile
    }

    async fn settle() {
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_confirm_round_trip_activates_with_term() {
        let fx = fixture();
        fx.store
            .upsert_profile(pending_executor("cust-1"), WriteSource::Authoritative)
            .await;
        fx.remote
            .seed_profile(customer_profile("cust-1", Some("exec-1")));
        settle().await;

        fx.reconciler.tick().await;
        settle().await;

        let profile = fx.store.get_profile(&UserId::from("exec-1")).unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(
            profile.subscribed_to_customer_id,
            Some(UserId::from("cust-1"))
        );
        assert!(profile.subscription_request.is_none());
        let start = profile.subscription_start_date.unwrap();
        let end = profile.subscription_end_date.unwrap();
        assert_eq!(end - start, chrono::Duration::days(30));
    }

    #[tokio::test]
    async fn test_reject_round_trip_clears_request() {
        let fx = fixture();
        fx.store
            .upsert_profile(pending_executor("cust-1"), WriteSource::Authoritative)
            .await;
        let mut customer = customer_profile("cust-1", None);
        customer.subscription_request = SubscriptionSignal::Rejected(UserId::from("exec-1"));
        fx.remote.seed_profile(customer);
        settle().await;

        fx.reconciler.tick().await;
        settle().await;

        let profile = fx.store.get_profile(&UserId::from("exec-1")).unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::None);
        assert!(profile.subscription_request.is_none());
    }

    #[tokio::test]
    async fn test_pending_with_no_answer_stays_pending() {
        let fx = fixture();
        fx.store
            .upsert_profile(pending_executor("cust-1"), WriteSource::Authoritative)
            .await;
        fx.remote.seed_profile(customer_profile("cust-1", None));
        settle().await;

        fx.reconciler.tick().await;
        settle().await;

        let profile = fx.store.get_profile(&UserId::from("exec-1")).unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Pending);
    }

    #[tokio::test]
    async fn test_tick_is_idempotent() {
        let fx = fixture();
        fx.store
            .upsert_profile(pending_executor("cust-1"), WriteSource::Authoritative)
            .await;
        fx.remote
            .seed_profile(customer_profile("cust-1", Some("exec-1")));
        settle().await;

        fx.reconciler.tick().await;
        settle().await;
        let after_first = fx.store.get_profile(&UserId::from("exec-1")).unwrap();

        // Second pass over the already-consistent snapshot: no corrections,
        // in particular no re-stamped dates.
        fx.reconciler.tick().await;
        settle().await;
        let after_second = fx.store.get_profile(&UserId::from("exec-1")).unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_asymmetric_cancel_clears_and_notifies_once() {
        let fx = fixture();
        fx.store
            .upsert_profile(active_executor("cust-1"), WriteSource::Authoritative)
            .await;
        // Customer moved to another executor.
        fx.remote
            .seed_profile(customer_profile("cust-1", Some("exec-9")));
        settle().await;

        fx.reconciler.tick().await;
        settle().await;
        // Repeated tick before anything else changes.
        fx.reconciler.tick().await;
        settle().await;

        let profile = fx.store.get_profile(&UserId::from("exec-1")).unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::None);
        assert!(profile.subscription_start_date.is_none());
        assert!(profile.subscription_end_date.is_none());
        assert!(profile.subscribed_to_customer_id.is_none());

        let warnings: Vec<_> = profile
            .notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_lapsed_term_expires() {
        let fx = fixture();
        let mut profile = active_executor("cust-1");
        profile.subscription_start_date = Some(Utc::now() - chrono::Duration::days(31));
        profile.subscription_end_date = Some(Utc::now() - chrono::Duration::days(1));
        fx.store
            .upsert_profile(profile, WriteSource::Authoritative)
            .await;
        // Customer still points at us; only the clock ran out.
        fx.remote
            .seed_profile(customer_profile("cust-1", Some("exec-1")));
        settle().await;

        fx.reconciler.tick().await;
        settle().await;

        let profile = fx.store.get_profile(&UserId::from("exec-1")).unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn test_missing_counterpart_skips_correction() {
        let fx = fixture();
        fx.store
            .upsert_profile(active_executor("cust-gone"), WriteSource::Authoritative)
            .await;
        settle().await;

        fx.reconciler.tick().await;
        settle().await;

        // No counterpart row: nothing changes this tick.
        let profile = fx.store.get_profile(&UserId::from("exec-1")).unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_customer_actor_never_reconciles() {
        let remote = Arc::new(MemoryDataStore::new());
        let (store, _join) = spawn_record_store(64, None);
        let customer = Session {
            user_id: UserId::from("cust-1"),
            role: Role::Customer,
        };
        let mutator = Arc::new(OptimisticMutator::new(
            customer.clone(),
            store.clone(),
            remote.clone() as Arc<dyn DataStore>,
        ));
        let (_tx, trigger_rx) = mpsc::channel(1);
        let reconciler = ReconcileLoop::new(
            ReconcileConfig::default(),
            customer,
            store.clone(),
            remote as Arc<dyn DataStore>,
            mutator,
            trigger_rx,
        );

        let mut profile = UserProfile::new(UserId::from("cust-1"), Role::Customer, "Sam");
        profile.subscribed_executor_id = Some(UserId::from("exec-1"));
        store
            .upsert_profile(profile.clone(), WriteSource::Authoritative)
            .await;
        settle().await;

        reconciler.tick().await;
        settle().await;

        assert_eq!(
            fx_profile(&store),
            profile,
            "customer profile must be untouched"
        );
    }

    fn fx_profile(store: &RecordStoreHandle) -> UserProfile {
        store.get_profile(&UserId::from("cust-1")).unwrap()
    }
}
