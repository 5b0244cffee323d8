//! Status condition tracker.

use tgrun_api::{
    set_condition, Condition, ConditionStatus, TerragruntRun, REASON_RECONCILING, TYPE_OUT_OF_SYNC,
};

/// Seed the initial status condition on a run that has none yet.
///
/// Returns whether the run was modified. A run that already carries any
/// condition is left untouched; this only marks the very first pass over a
/// freshly created object. Later transitions (workload readiness and the
/// like) are an extension point, not done here.
pub fn ensure_initial_condition(run: &mut TerragruntRun) -> bool {
    let status = run.status.get_or_insert_with(Default::default);
    if !status.conditions.is_empty() {
        return false;
    }
    set_condition(
        &mut status.conditions,
        Condition::new(
            TYPE_OUT_OF_SYNC,
            ConditionStatus::Unknown,
            REASON_RECONCILING,
            "Starting reconciliation",
        ),
    );
    true
}
