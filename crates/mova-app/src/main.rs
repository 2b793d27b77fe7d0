//! Mova sync client entry point.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mova_app::{App, AppConfig, BackendKind, Collaborators};
use mova_backend::{
    DataStore, MemoryDataStore, NullGeocoder, NullRecommender, RestDataStore, StaticAuth,
};
use mova_core::UserId;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mova", about = "Mova marketplace sync client", version)]
struct Cli {
    /// Path to a TOML config file (overrides MOVA_CONFIG).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mova_telemetry::init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    let remote: Arc<dyn DataStore> = match config.backend {
        BackendKind::Memory => Arc::new(MemoryDataStore::new()),
        BackendKind::Rest => {
            // validate() guarantees these are present for the rest backend.
            let url = config.rest_url.clone().unwrap_or_default();
            let api_key = config.rest_api_key.clone().unwrap_or_default();
            let schema = RestDataStore::resolve_schema(&url, &api_key).await?;
            info!(?schema, "resolved store schema");
            Arc::new(RestDataStore::new(url, &api_key, schema)?)
        }
    };

    let collaborators = Collaborators {
        remote,
        auth: Arc::new(StaticAuth::signed_in(
            UserId::from_string(config.actor_id.clone()),
            config.actor_role,
        )),
        geocoder: Arc::new(NullGeocoder),
        router: Arc::new(NullGeocoder),
        recommender: Arc::new(NullRecommender),
    };

    let app = App::start(&config, collaborators).await?;
    info!("client running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    app.shutdown().await;
    Ok(())
}
