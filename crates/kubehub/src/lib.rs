//! tgrun kubehub – live-cluster object store and controller wiring

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    api::{Api, PostParams},
    runtime::{controller::Action, watcher, Controller},
    Client, ResourceExt,
};
use metrics::counter;
use tracing::{debug, info, warn};

use tgrun_api::TerragruntRun;
use tgrun_reconcile::{reconcile_run, ObjectStore, Outcome, ReconcileError, RunnerConfig, StoreError};

/// Delay before retrying a failed pass; the controller owns backoff, the
/// engine never retries internally.
const ERROR_REQUEUE: Duration = Duration::from_secs(30);

fn store_err(e: kube::Error) -> StoreError {
    match &e {
        kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
            StoreError::AlreadyExists(ae.message.clone())
        }
        kube::Error::Api(ae) if ae.code == 409 => StoreError::Conflict(ae.message.clone()),
        _ => StoreError::Api(e.to_string()),
    }
}

/// [`ObjectStore`] backed by the apiserver through per-namespace `Api`
/// handles. Reads use `get_opt` so absence comes back as `None`; the status
/// write carries the resource version last read, so a stale update is a 409,
/// not a silent overwrite.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn runs(&self, namespace: &str) -> Api<TerragruntRun> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn workloads(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl ObjectStore for KubeStore {
    async fn get_run(&self, namespace: &str, name: &str) -> Result<Option<TerragruntRun>, StoreError> {
        self.runs(namespace).get_opt(name).await.map_err(store_err)
    }

    async fn update_run_status(&self, run: &TerragruntRun) -> Result<(), StoreError> {
        let namespace = run
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| StoreError::Api("run has no metadata.namespace".into()))?;
        let name = run
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| StoreError::Api("run has no metadata.name".into()))?;
        let data = serde_json::to_vec(run).map_err(|e| StoreError::Api(e.to_string()))?;
        self.runs(namespace)
            .replace_status(name, &PostParams::default(), data)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Deployment>, StoreError> {
        self.workloads(namespace).get_opt(name).await.map_err(store_err)
    }

    async fn create_workload(&self, workload: &Deployment) -> Result<(), StoreError> {
        let namespace = workload
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| StoreError::Api("workload has no metadata.namespace".into()))?;
        self.workloads(namespace)
            .create(&PostParams::default(), workload)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

struct Ctx {
    store: KubeStore,
    cfg: RunnerConfig,
}

async fn reconcile(run: Arc<TerragruntRun>, ctx: Arc<Ctx>) -> Result<Action, ReconcileError> {
    let namespace = run.namespace().unwrap_or_else(|| "default".to_string());
    let name = run.name_any();
    match reconcile_run(&ctx.store, &ctx.cfg, &namespace, &name).await? {
        Outcome::Done => Ok(Action::await_change()),
        Outcome::RequeueAfter(d) => Ok(Action::requeue(d)),
    }
}

fn error_policy(run: Arc<TerragruntRun>, err: &ReconcileError, _ctx: Arc<Ctx>) -> Action {
    warn!(run = %run.name_any(), error = %err, "reconcile failed; backing off");
    counter!("tgrun_reconcile_err", 1u64);
    Action::requeue(ERROR_REQUEUE)
}

/// Watch TerragruntRun objects (one namespace, or all when `None`) and drive
/// each change through the engine until shutdown.
pub async fn run_controller(cfg: RunnerConfig, namespace: Option<&str>) -> Result<()> {
    let client = Client::try_default().await?;
    let runs: Api<TerragruntRun> = match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };
    let ctx = Arc::new(Ctx { store: KubeStore::new(client), cfg });

    info!(ns = ?namespace, "controller started");
    Controller::new(runs, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(run = %obj.name, "reconciled"),
                Err(e) => warn!(error = %e, "controller error"),
            }
        })
        .await;
    warn!("controller stream ended");
    Ok(())
}
