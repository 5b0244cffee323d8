//! Reconciliation engine: one atomic pass per invocation.
//!
//! All state lives in the object store; nothing is cached across passes, so
//! re-delivery, overlap and staleness can only cost extra reads, never
//! correctness. Creation is conditionally idempotent: the single
//! ensure-workload-exists step treats a lost create race as success.

use std::time::Duration;

use metrics::counter;
use tracing::{debug, info};

use crate::store::{ObjectStore, StoreError};
use crate::{conditions, workload, ReconcileError, RunnerConfig};

/// What the pass decided; the caller maps this onto its scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing left to do; wait for the next externally triggered event.
    Done,
    /// Re-invoke after the delay to observe workload progress.
    RequeueAfter(Duration),
}

/// Run one reconciliation pass for the run at `(namespace, name)`.
pub async fn reconcile_run(
    store: &dyn ObjectStore,
    cfg: &RunnerConfig,
    namespace: &str,
    name: &str,
) -> Result<Outcome, ReconcileError> {
    counter!("tgrun_reconcile_passes", 1u64);

    let Some(mut run) = store.get_run(namespace, name).await? else {
        debug!(ns = %namespace, name = %name, "run not found; nothing to reconcile");
        return Ok(Outcome::Done);
    };

    if conditions::ensure_initial_condition(&mut run) {
        debug!(ns = %namespace, name = %name, "seeding initial status condition");
        store.update_run_status(&run).await?;
        // Re-fetch so the rest of the pass works on the stored version.
        run = match store.get_run(namespace, name).await? {
            Some(r) => r,
            None => {
                debug!(ns = %namespace, name = %name, "run deleted while seeding status");
                return Ok(Outcome::Done);
            }
        };
    }

    // Single ensure-workload-exists step: validate and build first (nothing
    // is persisted on a bad spec), check the derived identity once, create
    // only if absent.
    let desired = workload::build(&run, cfg)?;
    let workload_name = desired
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| ReconcileError::InvalidSpec("built workload has no name".into()))?;

    if store.get_workload(namespace, workload_name).await?.is_some() {
        debug!(ns = %namespace, name = %name, workload = %workload_name, "workload present; pass is a no-op");
        return Ok(Outcome::Done);
    }

    match store.create_workload(&desired).await {
        Ok(()) => {
            info!(ns = %namespace, name = %name, workload = %workload_name, "created workload");
            counter!("tgrun_workloads_created", 1u64);
            Ok(Outcome::RequeueAfter(cfg.requeue))
        }
        // A concurrent pass created it between our check and our create; the
        // winner already scheduled the follow-up pass.
        Err(StoreError::AlreadyExists(_)) => {
            debug!(ns = %namespace, name = %name, workload = %workload_name, "lost create race; treating as success");
            counter!("tgrun_create_races", 1u64);
            Ok(Outcome::Done)
        }
        Err(e) => Err(e.into()),
    }
}
