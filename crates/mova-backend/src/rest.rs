//! REST DataStore client (PostgREST-style hosted backend).
//!
//! Speaks the generic table API (`/rest/v1/{table}` with `column=eq.value`
//! filters) and maps rows to entities at this boundary. The change feed is a
//! poll-diff loop over the orders table: each tick fetches a snapshot and
//! emits Inserted/Updated/Deleted against the previous one. Deployments with
//! a realtime socket can swap the transport without touching the core; the
//! event contract is identical.

use std::collections::HashMap;
use std::time::Duration;

use mova_core::{Order, OrderId, UserId, UserProfile};
use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::datastore::{BoxFuture, ChangeEvent, DataStore, OrderFilter};
use crate::error::{BackendError, BackendResult};
use crate::rows::{OrderRow, ProfileRow};
use crate::schema::SchemaAdapter;

/// Capacity of the change-event channel handed to the subscriber.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Default poll interval for the change feed.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// REST client for the hosted store.
#[derive(Clone)]
pub struct RestDataStore {
    http: reqwest::Client,
    base_url: String,
    schema: SchemaAdapter,
    poll_interval: Duration,
}

impl RestDataStore {
    /// Create a client with a pre-resolved schema adapter.
    pub fn new(base_url: impl Into<String>, api_key: &str, schema: SchemaAdapter) -> BackendResult<Self> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(api_key)
            .map_err(|e| BackendError::InvalidRow(format!("api key: {e}")))?;
        headers.insert("apikey", key_value.clone());
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| BackendError::InvalidRow(format!("api key: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            schema,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Override the change-feed poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Resolve the schema adapter by probing the profiles table.
    ///
    /// Looks at one sample row to learn whether the deployment keys profiles
    /// on `id` or `user_id`. An empty table falls back to the default.
    pub async fn resolve_schema(
        base_url: &str,
        api_key: &str,
    ) -> BackendResult<SchemaAdapter> {
        let probe = Self::new(base_url, api_key, SchemaAdapter::default())?;
        let url = format!("{}/rest/v1/profiles?limit=1", probe.base_url);
        let rows: Vec<serde_json::Value> =
            Self::expect_ok(probe.http.get(url).send().await?).await?.json().await?;
        Ok(rows
            .first()
            .map(SchemaAdapter::detect_from_row)
            .unwrap_or_default())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// PostgREST query string for an order filter.
    fn filter_query(filter: &OrderFilter) -> String {
        match filter {
            OrderFilter::All => String::new(),
            OrderFilter::ByCustomer(id) => format!("?customer_id=eq.{id}"),
            OrderFilter::ByExecutor(id) => format!("?executor_id=eq.{id}"),
            OrderFilter::Open => "?status=eq.open".to_string(),
        }
    }

    async fn expect_ok(response: reqwest::Response) -> BackendResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(BackendError::Status {
                code: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    async fn fetch_order_snapshot(&self) -> BackendResult<HashMap<OrderId, Order>> {
        let url = format!("{}{}", self.table_url("orders"), Self::filter_query(&OrderFilter::All));
        let rows: Vec<OrderRow> = Self::expect_ok(self.http.get(url).send().await?)
            .await?
            .json()
            .await?;
        let mut snapshot = HashMap::with_capacity(rows.len());
        for row in rows {
            let order = row.into_entity()?;
            snapshot.insert(order.id.clone(), order);
        }
        Ok(snapshot)
    }

    /// One poll-diff pass: emit events for everything that changed since
    /// `previous`, then return the new snapshot.
    fn diff_snapshots(
        previous: &HashMap<OrderId, Order>,
        current: &HashMap<OrderId, Order>,
    ) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        for (id, order) in current {
            match previous.get(id) {
                None => events.push(ChangeEvent::Inserted(order.clone())),
                Some(old) if old != order => events.push(ChangeEvent::Updated(order.clone())),
                Some(_) => {}
            }
        }
        for id in previous.keys() {
            if !current.contains_key(id) {
                events.push(ChangeEvent::Deleted(id.clone()));
            }
        }
        events
    }
}

impl DataStore for RestDataStore {
    fn list_orders(&self, filter: OrderFilter) -> BoxFuture<'_, BackendResult<Vec<Order>>> {
        Box::pin(async move {
            let url = format!("{}{}", self.table_url("orders"), Self::filter_query(&filter));
            let rows: Vec<OrderRow> = Self::expect_ok(self.http.get(url).send().await?)
                .await?
                .json()
                .await?;
            rows.into_iter().map(OrderRow::into_entity).collect()
        })
    }

    fn insert_order(&self, order: &Order) -> BoxFuture<'_, BackendResult<Order>> {
        let row = OrderRow::from_entity(order);
        Box::pin(async move {
            let response = self
                .http
                .post(self.table_url("orders"))
                .header("Prefer", "return=representation")
                .json(&row)
                .send()
                .await?;
            let mut rows: Vec<OrderRow> = Self::expect_ok(response).await?.json().await?;
            rows.pop()
                .ok_or(BackendError::MissingColumn("returned row"))?
                .into_entity()
        })
    }

    fn update_order(&self, order: &Order) -> BoxFuture<'_, BackendResult<()>> {
        let row = OrderRow::from_entity(order);
        let url = format!("{}?id=eq.{}", self.table_url("orders"), order.id);
        Box::pin(async move {
            Self::expect_ok(self.http.patch(url).json(&row).send().await?).await?;
            Ok(())
        })
    }

    fn delete_order(&self, id: &OrderId) -> BoxFuture<'_, BackendResult<()>> {
        let url = format!("{}?id=eq.{}", self.table_url("orders"), id);
        Box::pin(async move {
            Self::expect_ok(self.http.delete(url).send().await?).await?;
            Ok(())
        })
    }

    fn fetch_profile(&self, id: &UserId) -> BoxFuture<'_, BackendResult<Option<UserProfile>>> {
        let column = self.schema.profile_id_column.column_name();
        let url = format!("{}?{column}=eq.{}", self.table_url("profiles"), id);
        Box::pin(async move {
            let mut rows: Vec<ProfileRow> = Self::expect_ok(self.http.get(url).send().await?)
                .await?
                .json()
                .await?;
            rows.pop()
                .map(|row| row.into_entity(&self.schema))
                .transpose()
        })
    }

    fn list_profiles(&self) -> BoxFuture<'_, BackendResult<Vec<UserProfile>>> {
        Box::pin(async move {
            let rows: Vec<ProfileRow> =
                Self::expect_ok(self.http.get(self.table_url("profiles")).send().await?)
                    .await?
                    .json()
                    .await?;
            rows.into_iter()
                .map(|row| row.into_entity(&self.schema))
                .collect()
        })
    }

    fn update_profile(&self, profile: &UserProfile) -> BoxFuture<'_, BackendResult<()>> {
        let row = ProfileRow::from_entity(profile, &self.schema);
        let column = self.schema.profile_id_column.column_name();
        let url = format!("{}?{column}=eq.{}", self.table_url("profiles"), profile.id);
        Box::pin(async move {
            Self::expect_ok(self.http.patch(url).json(&row).send().await?).await?;
            Ok(())
        })
    }

    fn subscribe_orders(&self) -> BoxFuture<'_, BackendResult<mpsc::Receiver<ChangeEvent>>> {
        let client = self.clone();
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(CHANGE_CHANNEL_CAPACITY);
            let mut previous = client.fetch_order_snapshot().await?;

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(client.poll_interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let current = match client.fetch_order_snapshot().await {
                        Ok(snapshot) => snapshot,
                        Err(error) => {
                            // Transient poll failure: keep the old snapshot,
                            // the next tick will catch up.
                            warn!(%error, "order change poll failed");
                            continue;
                        }
                    };
                    for event in Self::diff_snapshots(&previous, &current) {
                        if tx.send(event).await.is_err() {
                            debug!("change subscriber dropped, stopping poll");
                            return;
                        }
                    }
                    previous = current;
                }
            });

            Ok(rx)
        })
    }
}
