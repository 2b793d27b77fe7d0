//! Best-effort reconciliation of subscription state.
//!
//! The backing store cannot update the two sides of a subscription in one
//! transaction, so one side can silently miss its half of a confirmation or
//! cancellation. This loop detects the known-bad shapes on the executor's own
//! row against freshly-fetched counterpart state and heals them through the
//! same optimistic write path everything else uses. It only ever reconciles
//! subscriptions; orders are left to the realtime stream.

pub mod reconciler;

pub use reconciler::{ReconcileConfig, ReconcileLoop};
