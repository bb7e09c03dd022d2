// crates/core/src/lib.rs
//! State synchronization core for the job dashboard.
//!
//! The [`ReconciliationStore`] merges a one-shot snapshot and an unbounded
//! stream of job updates into one keyed collection and publishes a sorted,
//! read-only [`Projection`] to subscribers after every mutation.

pub mod config;
pub mod error;
pub mod projection;
pub mod store;

pub use config::DashboardConfig;
pub use error::*;
pub use projection::{Projection, ProjectionPublisher, ProjectionSubscription, StatusCounts};
pub use store::{ReconciliationStore, Upsert};

pub use job_dashboard_types as types;
