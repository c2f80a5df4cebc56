//! Feature-matrix builder: permission snapshot → dense 0/1 membership matrix.

use ndarray::{Array2, ArrayView2, Axis};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// No user anywhere holds any permission; there is nothing to fit a model on.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("permission universe is empty")]
pub struct NoSignal;

/// Dense 0/1 membership matrix: one row per user, one column per permission
/// in the universe observed at build time. The column set is recomputed on
/// every build, so scores are not comparable across runs with different
/// populations.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    universe: Vec<String>,
    users: Vec<String>,
    data: Array2<f64>,
}

impl FeatureMatrix {
    /// Build from a snapshot of `username → accumulated permissions`.
    /// Row order follows the map's (sorted) key order; column order is the
    /// sorted universe. Both are deterministic for a given snapshot.
    pub fn build(snapshot: &BTreeMap<String, BTreeSet<String>>) -> Result<Self, NoSignal> {
        let universe: Vec<String> = snapshot
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if universe.is_empty() {
            return Err(NoSignal);
        }

        let users: Vec<String> = snapshot.keys().cloned().collect();
        let mut data = Array2::zeros((users.len(), universe.len()));
        for (i, user) in users.iter().enumerate() {
            let held = &snapshot[user];
            for (j, perm) in universe.iter().enumerate() {
                if held.contains(perm) {
                    data[[i, j]] = 1.0;
                }
            }
        }

        Ok(Self {
            universe,
            users,
            data,
        })
    }

    /// Assemble from raw parts. Row count must match `users`, column count
    /// `universe`. Exists for callers that need to feed the scorer directly
    /// (tests, failure injection).
    pub fn from_parts(universe: Vec<String>, users: Vec<String>, data: Array2<f64>) -> Self {
        debug_assert_eq!(data.nrows(), users.len());
        debug_assert_eq!(data.ncols(), universe.len());
        Self {
            universe,
            users,
            data,
        }
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn n_users(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Fraction of the population holding each permission, keyed by name.
    pub fn column_means(&self) -> BTreeMap<String, f64> {
        match self.data.mean_axis(Axis(0)) {
            Some(means) => self
                .universe
                .iter()
                .cloned()
                .zip(means.iter().copied())
                .collect(),
            None => self.universe.iter().cloned().map(|p| (p, 0.0)).collect(),
        }
    }

    /// Permissions held by the user in the given row, in universe order.
    pub fn held_by(&self, row: usize) -> BTreeSet<String> {
        self.universe
            .iter()
            .enumerate()
            .filter(|(j, _)| self.data[[row, *j]] != 0.0)
            .map(|(_, p)| p.clone())
            .collect()
    }
}
