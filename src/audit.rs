//! One audit pass: store snapshot → feature matrix → risk scores → persist.

use crate::features::{FeatureMatrix, NoSignal};
use crate::risk::{RiskEngine, RiskResult, RiskStatus};
use crate::store::{PermissionStore, StoreError};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuditRun {
    pub id: String,
    pub results: BTreeMap<String, RiskResult>,
}

/// Run a full scoring pass over the store's current snapshot. An empty
/// permission universe yields the default batch without touching the model;
/// model failures are absorbed inside the engine. Score persistence is
/// idempotent, so re-running a pass is safe.
pub fn run_audit(
    store: &PermissionStore,
    engine: &RiskEngine,
    persist: bool,
) -> Result<AuditRun, StoreError> {
    let run_id = Uuid::new_v4().to_string();
    let snapshot = store.get_all_user_permissions()?;
    info!(run_id = %run_id, users = snapshot.len(), "audit pass starting");

    let results = match FeatureMatrix::build(&snapshot) {
        Ok(matrix) => {
            info!(
                run_id = %run_id,
                rows = matrix.n_users(),
                cols = matrix.n_features(),
                "feature matrix built"
            );
            engine.score(&matrix)
        }
        Err(NoSignal) => {
            info!(run_id = %run_id, "empty permission universe; default batch");
            RiskEngine::no_signal_batch(snapshot.into_keys())
        }
    };

    if persist {
        for (user, result) in &results {
            store.persist_risk_score(user, result.risk_score)?;
        }
    }

    let elevated = results
        .values()
        .filter(|r| r.status == RiskStatus::Elevated)
        .count();
    info!(run_id = %run_id, users = results.len(), elevated, "audit pass complete");
    Ok(AuditRun {
        id: run_id,
        results,
    })
}
