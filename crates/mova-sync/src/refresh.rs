//! Periodic profile refetch.
//!
//! Profiles are not streamed; the roster travels by full refetch on an
//! interval. Each successful fetch replaces the local roster wholesale,
//! which is also what clears any stale optimistic overlay on profiles.

use std::sync::Arc;
use std::time::Duration;

use mova_backend::DataStore;
use mova_store::RecordStoreHandle;
use tracing::{debug, warn};

/// Default roster refetch interval.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Polls the full profile roster into the record store.
pub struct ProfileRefresher {
    remote: Arc<dyn DataStore>,
    store: RecordStoreHandle,
    interval: Duration,
}

impl ProfileRefresher {
    pub fn new(remote: Arc<dyn DataStore>, store: RecordStoreHandle, interval: Duration) -> Self {
        Self {
            remote,
            store,
            interval,
        }
    }

    /// Fetch once, immediately.
    ///
    /// Errors degrade to "roster is stale until the next tick".
    pub async fn refresh_once(&self) {
        match self.remote.list_profiles().await {
            Ok(profiles) => {
                debug!(count = profiles.len(), "profile roster refreshed");
                self.store.replace_profiles(profiles).await;
            }
            Err(error) => {
                warn!(%error, "profile refetch failed, keeping stale roster");
            }
        }
    }

    /// Refresh on the configured interval until the store shuts down.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.refresh_once().await;
        }
    }
}
