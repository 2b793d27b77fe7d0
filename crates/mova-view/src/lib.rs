//! Role-dependent projections over record store snapshots.
//!
//! Pure functions, recomputed on every call; no caching. Presentation passes
//! in a snapshot and gets back exactly what the actor is allowed to see.

pub mod views;

pub use views::{
    my_orders, open_orders, sort_executors, visible_executors, ExecutorSort,
};
