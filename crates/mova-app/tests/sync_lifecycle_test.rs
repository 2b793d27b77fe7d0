//! End-to-end lifecycle test: two client sessions (customer and executor)
//! sharing one backing store, exercising the order marketplace flow and the
//! subscription confirm/cancel reconciliation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use mova_app::{App, AppConfig, Collaborators};
use mova_backend::{
    DataStore, MemoryDataStore, NullGeocoder, NullRecommender, StaticAuth,
};
use mova_core::{
    Location, NotificationKind, Order, OrderLocation, OrderStatus, Role, ServiceKind,
    SubscriptionStatus, UserId, UserProfile,
};
use mova_sync::Mutation;
use mova_view::ExecutorSort;
use rust_decimal_macros::dec;

const CUSTOMER: &str = "cust-1";
const EXECUTOR: &str = "exec-1";

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    // Tight intervals so the test observes reconciliation quickly.
    config.profile_refresh_secs = 1;
    config.reconcile.interval_secs = 1;
    config
}

async fn start_app(remote: Arc<MemoryDataStore>, user_id: &str, role: Role) -> App {
    let collaborators = Collaborators {
        remote: remote as Arc<dyn DataStore>,
        auth: Arc::new(StaticAuth::signed_in(UserId::from(user_id), role)),
        geocoder: Arc::new(NullGeocoder),
        router: Arc::new(NullGeocoder),
        recommender: Arc::new(NullRecommender),
    };
    App::start(&test_config(), collaborators)
        .await
        .expect("app should start")
}

fn sample_order() -> Order {
    Order::new(
        UserId::from(CUSTOMER),
        None,
        ServiceKind::Transfer,
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        dec!(45.00),
        OrderLocation::Route {
            from: Location::from_address("1 Main St"),
            to: Location::from_address("Clinic"),
        },
    )
    .unwrap()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

async fn settle_reconcile() {
    tokio::time::sleep(Duration::from_millis(2500)).await;
}

fn seeded_store() -> Arc<MemoryDataStore> {
    let remote = Arc::new(MemoryDataStore::new());
    remote.seed_profile(UserProfile::new(
        UserId::from(CUSTOMER),
        Role::Customer,
        "Sam",
    ));
    remote.seed_profile(UserProfile::new(
        UserId::from(EXECUTOR),
        Role::Executor,
        "Dana",
    ));
    remote
}

#[tokio::test]
async fn test_order_marketplace_lifecycle() {
    let remote = seeded_store();
    let customer = start_app(remote.clone(), CUSTOMER, Role::Customer).await;
    let executor = start_app(remote.clone(), EXECUTOR, Role::Executor).await;
    settle().await;

    // Customer publishes an open order; the executor sees it via realtime.
    let order = sample_order();
    let order_id = order.id.clone();
    customer.mutator().submit_order(order).await.unwrap();
    settle().await;

    assert_eq!(customer.my_orders().len(), 1);
    assert_eq!(executor.open_orders().len(), 1);

    // Executor responds; customer sees the response and selects them.
    executor
        .mutator()
        .apply(Mutation::RespondToOpenOrder {
            order_id: order_id.clone(),
        })
        .await
        .unwrap();
    settle().await;

    let seen = customer.store().get_order(&order_id).unwrap();
    assert_eq!(seen.responses, vec![UserId::from(EXECUTOR)]);

    customer
        .mutator()
        .apply(Mutation::SelectExecutor {
            order_id: order_id.clone(),
            executor_id: UserId::from(EXECUTOR),
        })
        .await
        .unwrap();
    settle().await;

    // Both sides converge on the confirmed order.
    assert_eq!(
        customer.store().get_order(&order_id).unwrap().status,
        OrderStatus::Confirmed
    );
    assert_eq!(executor.my_orders().len(), 1);

    // Executor rejects: the order reopens and the customer is warned.
    executor
        .mutator()
        .apply(Mutation::RejectOrder {
            order_id: order_id.clone(),
            reason: "vehicle breakdown".to_string(),
        })
        .await
        .unwrap();
    settle().await;

    let reopened = customer.store().get_order(&order_id).unwrap();
    assert_eq!(reopened.status, OrderStatus::Open);
    assert!(reopened.executor_id.is_none());
    assert_eq!(
        reopened.rejection_reason.as_deref(),
        Some("vehicle breakdown")
    );
    assert_eq!(customer.reopened_orders().len(), 1);

    let notifications = customer
        .store()
        .get_profile(&UserId::from(CUSTOMER))
        .unwrap()
        .notifications;
    let warnings: Vec<_> = notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("vehicle breakdown"));

    customer.shutdown().await;
    executor.shutdown().await;
}

#[tokio::test]
async fn test_subscription_confirm_and_cancel_reconciliation() {
    let remote = seeded_store();
    let customer = start_app(remote.clone(), CUSTOMER, Role::Customer).await;
    let executor = start_app(remote.clone(), EXECUTOR, Role::Executor).await;
    settle().await;

    // Executor requests a subscription to the customer.
    executor
        .mutator()
        .apply(Mutation::RequestSubscription {
            customer_id: UserId::from(CUSTOMER),
        })
        .await
        .unwrap();
    settle().await;

    // Customer confirms on their own row only; the executor's half of the
    // link is healed by the executor's reconciliation pass.
    customer
        .mutator()
        .apply(Mutation::ConfirmSubscription {
            executor_id: UserId::from(EXECUTOR),
        })
        .await
        .unwrap();
    settle_reconcile().await;

    let activated = executor
        .store()
        .get_profile(&UserId::from(EXECUTOR))
        .unwrap();
    assert_eq!(activated.subscription_status, SubscriptionStatus::Active);
    assert_eq!(
        activated.subscribed_to_customer_id,
        Some(UserId::from(CUSTOMER))
    );
    let start = activated.subscription_start_date.unwrap();
    let end = activated.subscription_end_date.unwrap();
    assert_eq!(end - start, chrono::Duration::days(30));

    // The subscribed executor stays visible to their own customer.
    let marketplace = customer.executor_marketplace(ExecutorSort::Rating);
    assert!(marketplace.iter().any(|p| p.id == UserId::from(EXECUTOR)));

    // Customer cancels; the executor detects the asymmetry and clears.
    customer
        .mutator()
        .apply(Mutation::CancelSubscription {
            reason: Some("moving away".to_string()),
        })
        .await
        .unwrap();
    settle_reconcile().await;

    let cleared = executor
        .store()
        .get_profile(&UserId::from(EXECUTOR))
        .unwrap();
    assert_eq!(cleared.subscription_status, SubscriptionStatus::None);
    assert!(cleared.subscribed_to_customer_id.is_none());
    assert!(cleared.subscription_end_date.is_none());
    assert!(cleared
        .notifications
        .iter()
        .any(|n| n.kind == NotificationKind::Warning));

    customer.shutdown().await;
    executor.shutdown().await;
}

#[tokio::test]
async fn test_subscription_reject_reconciliation() {
    let remote = seeded_store();
    let customer = start_app(remote.clone(), CUSTOMER, Role::Customer).await;
    let executor = start_app(remote.clone(), EXECUTOR, Role::Executor).await;
    settle().await;

    executor
        .mutator()
        .apply(Mutation::RequestSubscription {
            customer_id: UserId::from(CUSTOMER),
        })
        .await
        .unwrap();
    settle().await;

    // Customer rejects; the sentinel travels through the shared column and
    // the executor's reconciliation decodes it.
    customer
        .mutator()
        .apply(Mutation::RejectSubscription {
            executor_id: UserId::from(EXECUTOR),
        })
        .await
        .unwrap();
    settle_reconcile().await;

    let profile = executor
        .store()
        .get_profile(&UserId::from(EXECUTOR))
        .unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::None);
    assert!(profile.subscription_request.is_none());

    customer.shutdown().await;
    executor.shutdown().await;
}

#[tokio::test]
async fn test_smart_search_degrades_to_none() {
    let remote = seeded_store();
    let customer = start_app(remote, CUSTOMER, Role::Customer).await;
    settle().await;

    // Null recommender: no recommendation, no error.
    assert_eq!(customer.smart_search("wheelchair van").await, None);

    // Null geocoder: the address survives without coordinates.
    let location = customer.resolve_location("1 Main St").await;
    assert_eq!(location.address, "1 Main St");
    assert!(location.point.is_none());

    // No coordinates means no route preview either.
    let destination = customer.resolve_location("Clinic").await;
    assert!(customer.route_between(&location, &destination).await.is_none());

    customer.shutdown().await;
}
