//! Application wiring.
//!
//! Brings up the record store actor and its three feeders (optimistic
//! mutator, realtime ingest, profile refresher) plus the reconciliation
//! loop, then hands out the session-scoped handles presentation needs.

use std::sync::Arc;
use std::time::Duration;

use mova_backend::{
    AuthService, DataStore, GeocodingService, OrderFilter, RecommendationService, RouteSummary,
    RoutingService, Session,
};
use mova_core::{Location, Order, OrderStatus, Role, UserProfile};
use mova_reconcile::ReconcileLoop;
use mova_store::{spawn_record_store, RecordStoreHandle, WriteSource};
use mova_sync::{OptimisticMutator, ProfileRefresher, RealtimeIngest};
use mova_view::{my_orders, open_orders, sort_executors, visible_executors, ExecutorSort};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppResult;

/// External collaborators injected at startup.
pub struct Collaborators {
    pub remote: Arc<dyn DataStore>,
    pub auth: Arc<dyn AuthService>,
    pub geocoder: Arc<dyn GeocodingService>,
    pub router: Arc<dyn RoutingService>,
    pub recommender: Arc<dyn RecommendationService>,
}

/// A running client instance.
pub struct App {
    session: Session,
    store: RecordStoreHandle,
    mutator: Arc<OptimisticMutator>,
    geocoder: Arc<dyn GeocodingService>,
    router: Arc<dyn RoutingService>,
    recommender: Arc<dyn RecommendationService>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Start all components for the current session.
    ///
    /// An auth failure is returned as [`crate::error::AppError::Auth`]; the
    /// caller surfaces the logged-out view instead of a degraded client.
    pub async fn start(config: &AppConfig, collaborators: Collaborators) -> AppResult<Self> {
        let Collaborators {
            remote,
            auth,
            geocoder,
            router,
            recommender,
        } = collaborators;

        let session = auth.current_session().await?;
        info!(actor = %session.user_id, role = %session.role, "starting client session");

        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (store, store_join) =
            spawn_record_store(config.store_queue_capacity, Some(trigger_tx));
        let mutator = Arc::new(OptimisticMutator::new(
            session.clone(),
            store.clone(),
            remote.clone(),
        ));
        let mut tasks = vec![store_join];

        // Initial order load, scoped the same way the relevance filter is.
        for order in Self::initial_orders(&session, remote.as_ref()).await? {
            store.upsert_order(order, WriteSource::Authoritative).await;
        }

        // Profiles: one eager load, then the periodic refetch.
        let refresher = ProfileRefresher::new(
            remote.clone(),
            store.clone(),
            Duration::from_secs(config.profile_refresh_secs),
        );
        refresher.refresh_once().await;
        tasks.push(tokio::spawn(refresher.run()));

        // Realtime order stream.
        let events = remote.subscribe_orders().await?;
        let ingest = RealtimeIngest::new(session.clone(), store.clone(), mutator.clone(), events);
        tasks.push(tokio::spawn(ingest.run()));

        // Subscription self-repair.
        let reconciler = ReconcileLoop::new(
            config.reconcile.clone(),
            session.clone(),
            store.clone(),
            remote.clone(),
            mutator.clone(),
            trigger_rx,
        );
        tasks.push(tokio::spawn(reconciler.run()));

        Ok(Self {
            session,
            store,
            mutator,
            geocoder,
            router,
            recommender,
            tasks,
        })
    }

    async fn initial_orders(
        session: &Session,
        remote: &dyn DataStore,
    ) -> AppResult<Vec<Order>> {
        let orders = match session.role {
            Role::Customer => {
                remote
                    .list_orders(OrderFilter::ByCustomer(session.user_id.clone()))
                    .await?
            }
            Role::Executor => {
                let mut orders = remote
                    .list_orders(OrderFilter::ByExecutor(session.user_id.clone()))
                    .await?;
                for open in remote.list_orders(OrderFilter::Open).await? {
                    if !orders.iter().any(|o| o.id == open.id) {
                        orders.push(open);
                    }
                }
                orders
            }
            Role::Admin => remote.list_orders(OrderFilter::All).await?,
        };
        Ok(orders)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &RecordStoreHandle {
        &self.store
    }

    pub fn mutator(&self) -> &Arc<OptimisticMutator> {
        &self.mutator
    }

    // === Projections for presentation ===

    #[must_use]
    pub fn my_orders(&self) -> Vec<Order> {
        my_orders(&self.session, &self.store.orders_snapshot())
    }

    #[must_use]
    pub fn open_orders(&self) -> Vec<Order> {
        open_orders(&self.session, &self.store.orders_snapshot())
    }

    /// Executors visible to this customer, in the selected order.
    #[must_use]
    pub fn executor_marketplace(&self, sort: ExecutorSort) -> Vec<UserProfile> {
        let visible = visible_executors(&self.session.user_id, &self.store.profiles_snapshot());
        sort_executors(visible, sort)
    }

    /// Orders of mine that ended up back on the marketplace.
    #[must_use]
    pub fn reopened_orders(&self) -> Vec<Order> {
        self.my_orders()
            .into_iter()
            .filter(|o| o.status == OrderStatus::Open && o.rejection_reason.is_some())
            .collect()
    }

    // === Collaborator-backed helpers ===

    /// Build a location from a free-form address, geocoding when possible.
    pub async fn resolve_location(&self, address: &str) -> Location {
        Location {
            address: address.to_string(),
            point: self.geocoder.geocode(address).await,
        }
    }

    /// Route between two resolved locations, for transfer previews.
    ///
    /// `None` when either side lacks coordinates or routing is unavailable.
    pub async fn route_between(&self, from: &Location, to: &Location) -> Option<RouteSummary> {
        let (from, to) = (from.point?, to.point?);
        self.router.route(from, to).await
    }

    /// Free-text executor recommendation over the visible roster.
    ///
    /// Best effort: any failure is already `None` by the service contract.
    pub async fn smart_search(&self, query: &str) -> Option<String> {
        let executors = self.executor_marketplace(ExecutorSort::Rating);
        self.recommender.recommend(query, &executors).await
    }

    /// Stop all background tasks.
    pub async fn shutdown(mut self) {
        info!("shutting down client session");
        self.store.shutdown().await;
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
