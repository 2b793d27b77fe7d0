//! Application configuration.

use crate::error::{AppError, AppResult};
use mova_core::Role;
use mova_reconcile::ReconcileConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which DataStore implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process store, for local runs and tests.
    #[default]
    Memory,
    /// Hosted PostgREST-style store.
    Rest,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Base URL of the hosted store (required for the rest backend).
    #[serde(default)]
    pub rest_url: Option<String>,
    /// API key for the hosted store (required for the rest backend).
    #[serde(default)]
    pub rest_api_key: Option<String>,

    /// Actor identity used by the local auth stub.
    #[serde(default = "default_actor_id")]
    pub actor_id: String,
    #[serde(default = "default_actor_role")]
    pub actor_role: Role,

    /// Record store command queue capacity.
    #[serde(default = "default_store_queue_capacity")]
    pub store_queue_capacity: usize,
    /// Profile roster refetch interval (seconds).
    #[serde(default = "default_profile_refresh_secs")]
    pub profile_refresh_secs: u64,

    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

fn default_actor_id() -> String {
    "usr_local".to_string()
}

fn default_actor_role() -> Role {
    Role::Customer
}

fn default_store_queue_capacity() -> usize {
    256
}

fn default_profile_refresh_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            rest_url: None,
            rest_api_key: None,
            actor_id: default_actor_id(),
            actor_role: default_actor_role(),
            store_queue_capacity: default_store_queue_capacity(),
            profile_refresh_secs: default_profile_refresh_secs(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `MOVA_CONFIG` or `config/default.toml`, falling back to
    /// defaults when the file is absent.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("MOVA_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field requirements.
    pub fn validate(&self) -> AppResult<()> {
        if self.backend == BackendKind::Rest {
            if self.rest_url.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::Config(
                    "rest backend requires rest_url".to_string(),
                ));
            }
            if self.rest_api_key.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::Config(
                    "rest backend requires rest_api_key".to_string(),
                ));
            }
        }
        Ok(())
    }
}
