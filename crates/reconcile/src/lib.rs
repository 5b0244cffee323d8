//! tgrun reconcile core: the per-pass decision procedure.
//!
//! Everything in this crate is cluster-agnostic; the platform object store is
//! reached only through the [`ObjectStore`] trait so the engine can be driven
//! against a fake store in tests.

#![forbid(unsafe_code)]

pub mod conditions;
pub mod config;
pub mod engine;
pub mod store;
pub mod workload;

pub use config::RunnerConfig;
pub use engine::{reconcile_run, Outcome};
pub use store::{ObjectStore, StoreError};

/// Errors a reconciliation pass can surface to its caller.
///
/// The event source owns retry policy; nothing here is retried internally
/// beyond the single post-creation requeue the engine schedules itself.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// `spec.path` is empty or derives an unusable workload name. Retrying
    /// without an input change will not help.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),
    /// The owner link from workload back to run could not be established;
    /// nothing is persisted in that case.
    #[error("ownership link: {0}")]
    OwnershipLink(String),
    /// Object store failure (read or write), surfaced for external backoff.
    #[error("store: {0}")]
    Store(#[from] StoreError),
}
