//! Workload spec builder: maps a run's desired state to a Deployment.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::Resource;
use tgrun_api::TerragruntRun;

use crate::{ReconcileError, RunnerConfig};

/// The derived name doubles as the `app` label value, so the label-value
/// limit applies, not the longer object-name one.
const MAX_NAME_LEN: usize = 63;

const APP_LABEL: &str = "app";

/// Reduce a terragrunt path to an RFC 1123 label fragment: lowercase
/// alphanumerics with single dashes where separator runs were.
fn sanitize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Derive the workload name for `(run name, spec.path)`.
///
/// Deterministic and validating: the same inputs always produce the same
/// name, and a path that cannot yield a usable identifier is rejected before
/// any object is built.
pub fn derive_name(run_name: &str, path: &str) -> Result<String, ReconcileError> {
    if path.trim().is_empty() {
        return Err(ReconcileError::InvalidSpec("spec.path must not be empty".into()));
    }
    let slug = sanitize(path);
    if slug.is_empty() {
        return Err(ReconcileError::InvalidSpec(format!(
            "spec.path {path:?} yields no usable characters for a workload name"
        )));
    }
    let name = format!("{run_name}-terragrunt-{slug}");
    if name.len() > MAX_NAME_LEN {
        return Err(ReconcileError::InvalidSpec(format!(
            "derived workload name {name:?} exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Build the runner Deployment for `run`.
///
/// Pure: no I/O, and two calls with the same run and config yield identical
/// definitions, which is what makes the absent-then-create check re-runnable.
/// The controller owner reference is attached here, before anything is
/// persisted; a run that cannot be linked (no uid) aborts the build.
pub fn build(run: &TerragruntRun, cfg: &RunnerConfig) -> Result<Deployment, ReconcileError> {
    let run_name = run
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| ReconcileError::InvalidSpec("run has no metadata.name".into()))?;
    let namespace = run
        .metadata
        .namespace
        .as_deref()
        .ok_or_else(|| ReconcileError::InvalidSpec("run has no metadata.namespace".into()))?;
    let name = derive_name(run_name, &run.spec.path)?;

    let owner = run.controller_owner_ref(&()).ok_or_else(|| {
        ReconcileError::OwnershipLink(format!("run {namespace}/{run_name} carries no uid to own a workload"))
    })?;

    let labels = BTreeMap::from([(APP_LABEL.to_string(), name.clone())]);
    let command = vec![
        "echo".to_string(),
        "Path:".to_string(),
        run.spec.path.clone(),
        "&&".to_string(),
        "sleep".to_string(),
        cfg.sleep_secs.to_string(),
    ];

    Ok(Deployment {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name,
                        image: Some(cfg.image.clone()),
                        image_pull_policy: Some("IfNotPresent".to_string()),
                        command: Some(command),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}
