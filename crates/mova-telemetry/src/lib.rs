//! Telemetry for the Mova sync client.
//!
//! Structured logging via tracing and Prometheus metrics for the sync paths
//! (mutations, ingest, reconciliation).

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
