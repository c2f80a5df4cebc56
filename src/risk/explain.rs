//! Univariate explanation: which of a user's permissions are rare in the
//! population.

use std::collections::{BTreeMap, BTreeSet};

/// Permissions held by the user whose population share is below
/// `rare_threshold`, in the set's (sorted) order. Empty when the user holds
/// only common permissions — a flagged user can still have no univariate
/// explanation if the model reacted to a multivariate pattern.
pub fn explain(
    user_permissions: &BTreeSet<String>,
    column_means: &BTreeMap<String, f64>,
    rare_threshold: f64,
) -> Vec<String> {
    user_permissions
        .iter()
        .filter(|p| column_means.get(*p).is_some_and(|m| *m < rare_threshold))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(perms: &[&str]) -> BTreeSet<String> {
        perms.iter().map(|p| p.to_string()).collect()
    }

    fn means(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(p, m)| (p.to_string(), *m)).collect()
    }

    #[test]
    fn rare_permission_is_flagged() {
        let out = explain(&set(&["X", "Y"]), &means(&[("X", 0.1), ("Y", 0.9)]), 0.3);
        assert_eq!(out, vec!["X".to_string()]);
    }

    #[test]
    fn threshold_is_exclusive() {
        // A share exactly at the threshold is not rare.
        let out = explain(&set(&["X"]), &means(&[("X", 0.3)]), 0.3);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_permissions_are_ignored() {
        let out = explain(&set(&["X", "ghost"]), &means(&[("X", 0.1)]), 0.3);
        assert_eq!(out, vec!["X".to_string()]);
    }

    #[test]
    fn accumulating_grants_never_shrinks_the_explanation() {
        let m = means(&[("a", 0.1), ("b", 0.8), ("c", 0.2), ("d", 0.9)]);
        let before = explain(&set(&["a", "b"]), &m, 0.3);
        let after = explain(&set(&["a", "b", "c", "d"]), &m, 0.3);
        assert!(before.iter().all(|p| after.contains(p)));
        assert_eq!(after, vec!["a".to_string(), "c".to_string()]);
    }
}
