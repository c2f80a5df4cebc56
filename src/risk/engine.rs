//! Scores a whole permission snapshot; model failures are absorbed into a
//! default-safe batch, never surfaced to the caller.

use crate::config::ScoringConfig;
use crate::features::FeatureMatrix;
use crate::model::{ForestParams, IsolationForest, ModelError};
use crate::risk::explain::explain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    Elevated,
    Nominal,
}

impl RiskStatus {
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            RiskStatus::Elevated
        } else {
            RiskStatus::Nominal
        }
    }
}

/// Why a user was (or was not) flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "permissions", rename_all = "snake_case")]
pub enum Reason {
    /// Permissions held by this user that few others hold, in set order.
    RarePermissions(Vec<String>),
    /// No univariate rare-permission explanation; a flagged user with this
    /// reason was isolated by a multivariate pattern.
    NormalUsage,
    /// Empty permission universe; scoring was skipped.
    NoPermissions,
    /// Model fit failed; the whole batch fell back to defaults.
    ScoringUnavailable,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::RarePermissions(perms) => write!(f, "{}", perms.join(", ")),
            Reason::NormalUsage => write!(f, "normal usage"),
            Reason::NoPermissions => write!(f, "no permissions"),
            Reason::ScoringUnavailable => write!(f, "scoring unavailable"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResult {
    pub user_id: String,
    /// Clamped to [0, 100]
    pub risk_score: f64,
    pub status: RiskStatus,
    pub reason: Reason,
}

impl RiskResult {
    /// Default-safe result used when the universe is empty or the model fails.
    pub fn fallback(user_id: String, reason: Reason) -> Self {
        Self {
            user_id,
            risk_score: 0.0,
            status: RiskStatus::Nominal,
            reason,
        }
    }
}

pub struct RiskEngine {
    config: ScoringConfig,
}

impl RiskEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score every user in the matrix in one pass. There is no per-row error
    /// isolation: a model failure degrades the entire batch to
    /// `{0, Nominal, ScoringUnavailable}` and is logged, not returned.
    pub fn score(&self, matrix: &FeatureMatrix) -> BTreeMap<String, RiskResult> {
        let params = ForestParams {
            trees: self.config.trees,
            sample_size: self.config.sample_size,
            contamination: self.config.contamination,
            seed: self.config.seed,
        };
        let forest = match IsolationForest::fit(matrix.view(), &params) {
            Ok(f) => f,
            Err(err) => return self.unavailable(matrix, &err),
        };

        let means = matrix.column_means();
        let mut out = BTreeMap::new();
        for (row, user) in matrix.users().iter().enumerate() {
            let decision = forest.decision_function(matrix.view().row(row));
            let risk_score = ((self.config.score_offset - decision) * self.config.score_scale)
                .clamp(0.0, 100.0);
            let status = RiskStatus::from_score(risk_score, self.config.elevated_threshold);
            let held = matrix.held_by(row);
            let rare = explain(&held, &means, self.config.rare_threshold);
            let reason = if rare.is_empty() {
                Reason::NormalUsage
            } else {
                Reason::RarePermissions(rare)
            };
            debug!(user = %user, risk_score, ?status, "scored user");
            out.insert(
                user.clone(),
                RiskResult {
                    user_id: user.clone(),
                    risk_score,
                    status,
                    reason,
                },
            );
        }
        out
    }

    /// Default batch for an empty permission universe; callers reach this on
    /// [`crate::features::NoSignal`] instead of invoking the scorer.
    pub fn no_signal_batch(
        users: impl IntoIterator<Item = String>,
    ) -> BTreeMap<String, RiskResult> {
        users
            .into_iter()
            .map(|u| (u.clone(), RiskResult::fallback(u, Reason::NoPermissions)))
            .collect()
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn unavailable(
        &self,
        matrix: &FeatureMatrix,
        err: &ModelError,
    ) -> BTreeMap<String, RiskResult> {
        warn!(
            rows = matrix.n_users(),
            cols = matrix.n_features(),
            contamination = self.config.contamination,
            seed = self.config.seed,
            error = %err,
            "model fit failed; batch degraded to default results"
        );
        matrix
            .users()
            .iter()
            .map(|u| {
                (
                    u.clone(),
                    RiskResult::fallback(u.clone(), Reason::ScoringUnavailable),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::collections::{BTreeMap, BTreeSet};

    fn engine() -> RiskEngine {
        RiskEngine::new(ScoringConfig::default())
    }

    fn creep_snapshot() -> BTreeMap<String, BTreeSet<String>> {
        let all: BTreeSet<String> = ["A", "B", "C", "D"].iter().map(|p| p.to_string()).collect();
        let mut snap = BTreeMap::new();
        for i in 0..9 {
            snap.insert(format!("user_{:02}", i), all.clone());
        }
        snap.insert(
            "user_99".to_string(),
            ["A"].iter().map(|p| p.to_string()).collect(),
        );
        snap
    }

    #[test]
    fn scores_are_bounded_and_status_matches_threshold() {
        let matrix = FeatureMatrix::build(&creep_snapshot()).unwrap();
        let results = engine().score(&matrix);
        assert_eq!(results.len(), 10);
        for r in results.values() {
            assert!((0.0..=100.0).contains(&r.risk_score));
            let expected = if r.risk_score > 65.0 {
                RiskStatus::Elevated
            } else {
                RiskStatus::Nominal
            };
            assert_eq!(r.status, expected);
        }
    }

    #[test]
    fn sparse_holder_outranks_the_common_baseline() {
        let matrix = FeatureMatrix::build(&creep_snapshot()).unwrap();
        let results = engine().score(&matrix);
        let baseline = &results["user_00"];
        let sparse = &results["user_99"];
        assert!(sparse.risk_score > baseline.risk_score);
        assert_eq!(sparse.status, RiskStatus::Elevated);
        // user_99 holds only the permission everyone has, so the univariate
        // check has nothing to point at even though the pattern is anomalous.
        assert_eq!(sparse.reason, Reason::NormalUsage);
        assert_eq!(baseline.status, RiskStatus::Nominal);
    }

    #[test]
    fn scoring_is_deterministic() {
        let matrix = FeatureMatrix::build(&creep_snapshot()).unwrap();
        let e = engine();
        let a = e.score(&matrix);
        let b = e.score(&matrix);
        for (user, ra) in &a {
            assert_eq!(ra.risk_score, b[user].risk_score);
            assert_eq!(ra.status, b[user].status);
            assert_eq!(ra.reason, b[user].reason);
        }
    }

    #[test]
    fn rare_permissions_show_up_as_reasons() {
        let mut snap = creep_snapshot();
        // One user drags in a grant nobody else has.
        snap.get_mut("user_00")
            .unwrap()
            .insert("server_root".to_string());
        let matrix = FeatureMatrix::build(&snap).unwrap();
        let results = engine().score(&matrix);
        match &results["user_00"].reason {
            Reason::RarePermissions(perms) => {
                assert_eq!(perms, &vec!["server_root".to_string()])
            }
            other => panic!("expected rare-permission reason, got {:?}", other),
        }
    }

    #[test]
    fn model_failure_degrades_whole_batch() {
        let users = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let universe = vec!["p".to_string(), "q".to_string()];
        let mut data = Array2::<f64>::ones((3, 2));
        data[[1, 0]] = f64::NAN;
        let matrix = FeatureMatrix::from_parts(universe, users, data);

        let results = engine().score(&matrix);
        assert_eq!(results.len(), 3);
        for r in results.values() {
            assert_eq!(r.risk_score, 0.0);
            assert_eq!(r.status, RiskStatus::Nominal);
            assert_eq!(r.reason, Reason::ScoringUnavailable);
        }
    }

    #[test]
    fn invalid_contamination_degrades_not_panics() {
        let config = ScoringConfig {
            contamination: 0.75,
            ..ScoringConfig::default()
        };
        let matrix = FeatureMatrix::build(&creep_snapshot()).unwrap();
        let results = RiskEngine::new(config).score(&matrix);
        assert!(results
            .values()
            .all(|r| r.reason == Reason::ScoringUnavailable));
    }

    #[test]
    fn no_signal_batch_defaults_every_user() {
        let results =
            RiskEngine::no_signal_batch(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(results.len(), 2);
        for r in results.values() {
            assert_eq!(r.risk_score, 0.0);
            assert_eq!(r.status, RiskStatus::Nominal);
            assert_eq!(r.reason, Reason::NoPermissions);
        }
    }
}
