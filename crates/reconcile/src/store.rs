//! Object store seam between the engine and the platform API.

use k8s_openapi::api::apps::v1::Deployment;
use tgrun_api::TerragruntRun;

/// Store failures. "Not found" on a read is not an error here; the `get_*`
/// methods return `Ok(None)` for it so absence stays a control-flow signal.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Create hit an object that already exists. Benign exactly at the
    /// engine's single creation point (a concurrent pass won the race).
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Optimistic update lost against a newer resource version.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Anything else the API returned (network, auth, server-side).
    #[error("api: {0}")]
    Api(String),
}

/// Get/Create/Update surface the engine consumes, keyed by
/// `(namespace, name)`. One live-cluster implementation exists in
/// `tgrun-kubehub`; tests drive the engine with an in-memory fake.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a run; `Ok(None)` when it no longer exists.
    async fn get_run(&self, namespace: &str, name: &str) -> Result<Option<TerragruntRun>, StoreError>;

    /// Persist the run's status against the resource version last read.
    /// A stale write must fail with [`StoreError::Conflict`], never silently
    /// overwrite.
    async fn update_run_status(&self, run: &TerragruntRun) -> Result<(), StoreError>;

    /// Fetch the workload at the derived identity; `Ok(None)` when absent.
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Deployment>, StoreError>;

    /// Create the workload. Must fail with [`StoreError::AlreadyExists`] when
    /// an object of that name is already present.
    async fn create_workload(&self, workload: &Deployment) -> Result<(), StoreError>;
}
