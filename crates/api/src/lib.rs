//! tgrun CRD types: the TerragruntRun resource and its status conditions.

#![forbid(unsafe_code)]

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type seeded on a freshly created run.
pub const TYPE_OUT_OF_SYNC: &str = "OutOfSync";
/// Reason attached to the seeded condition.
pub const REASON_RECONCILING: &str = "Reconciling";

/// Desired state: a single terragrunt working directory to provision.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "terragrunt.tgrun.dev",
    version = "v1alpha1",
    kind = "TerragruntRun",
    namespaced,
    status = "TerragruntRunStatus",
    shortname = "tgr",
    printcolumn = r#"{"name":"Path","type":"string","jsonPath":".spec.path"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TerragruntRunSpec {
    /// Path of the terragrunt module to run, relative to the repo root.
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerragruntRunStatus {
    /// Latest observations of the run's state, at most one entry per type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl Condition {
    /// Build a condition stamped with the current wall-clock time.
    pub fn new(type_: &str, status: ConditionStatus, reason: &str, message: &str) -> Self {
        Self {
            type_: type_.to_string(),
            status,
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Upsert `cond` into `conditions` keyed by `type`.
///
/// A condition set never holds two entries of the same type; setting an
/// existing type replaces the previous entry in place.
pub fn set_condition(conditions: &mut Vec<Condition>, cond: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == cond.type_) {
        Some(existing) => *existing = cond,
        None => conditions.push(cond),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_condition_appends_new_types() {
        let mut conds = Vec::new();
        set_condition(
            &mut conds,
            Condition::new(TYPE_OUT_OF_SYNC, ConditionStatus::Unknown, REASON_RECONCILING, "starting"),
        );
        set_condition(&mut conds, Condition::new("Ready", ConditionStatus::False, "Pending", "waiting"));
        assert_eq!(conds.len(), 2);
    }

    #[test]
    fn set_condition_replaces_existing_type() {
        let mut conds = Vec::new();
        set_condition(
            &mut conds,
            Condition::new(TYPE_OUT_OF_SYNC, ConditionStatus::Unknown, REASON_RECONCILING, "starting"),
        );
        set_condition(
            &mut conds,
            Condition::new(TYPE_OUT_OF_SYNC, ConditionStatus::True, "Drift", "plan has changes"),
        );
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].status, ConditionStatus::True);
        assert_eq!(conds[0].reason, "Drift");
    }

    #[test]
    fn condition_serializes_with_k8s_field_names() {
        let c = Condition {
            type_: TYPE_OUT_OF_SYNC.into(),
            status: ConditionStatus::Unknown,
            reason: REASON_RECONCILING.into(),
            message: "Starting reconciliation".into(),
            last_transition_time: Some("2025-01-01T00:00:00+00:00".into()),
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["type"], "OutOfSync");
        assert_eq!(v["status"], "Unknown");
        assert_eq!(v["lastTransitionTime"], "2025-01-01T00:00:00+00:00");
    }
}
