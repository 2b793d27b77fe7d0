//! Backend collaborator interfaces for the Mova sync core.
//!
//! The core never sees raw rows: this crate owns the adapter boundary where
//! snake_case store columns become typed entities, including the subscription
//! rejection sentinel decode and the configurable profile id column.

pub mod datastore;
pub mod error;
pub mod memory;
pub mod rest;
pub mod rows;
pub mod schema;
pub mod services;

pub use datastore::{BoxFuture, ChangeEvent, DataStore, OrderFilter};
pub use error::{AuthError, BackendError, BackendResult};
pub use memory::MemoryDataStore;
pub use rest::RestDataStore;
pub use rows::{OrderRow, ProfileRow};
pub use schema::{IdColumn, SchemaAdapter};
pub use services::{
    GeocodingService, NullGeocoder, NullRecommender, RecommendationService, RouteSummary,
    RoutingService, Session, StaticAuth, AuthService,
};
