//! Role catalog: the single injected role → expected-permission table.
//! Excess permissions are whatever a user holds beyond their current role.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleCatalog {
    roles: BTreeMap<String, BTreeSet<String>>,
}

impl Default for RoleCatalog {
    fn default() -> Self {
        let mut roles = BTreeMap::new();
        for (role, perms) in [
            ("HR", &["view_salaries", "edit_profiles", "onboard_users"][..]),
            ("Developer", &["access_github", "deploy_code", "read_logs"]),
            (
                "Finance",
                &["process_payments", "view_tax_data", "approve_expenses"],
            ),
            ("DevOps", &["db_admin", "server_root", "manage_cloud"]),
        ] {
            roles.insert(
                role.to_string(),
                perms.iter().map(|p| p.to_string()).collect(),
            );
        }
        Self { roles }
    }
}

impl RoleCatalog {
    pub fn new(roles: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { roles }
    }

    pub fn expected(&self, role: &str) -> Option<&BTreeSet<String>> {
        self.roles.get(role)
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Held permissions not expected for the user's current role, sorted.
    /// Unknown roles expect nothing, so everything held is excess.
    pub fn excess(&self, role: &str, held: &BTreeSet<String>) -> Vec<String> {
        match self.expected(role) {
            Some(expected) => held.difference(expected).cloned().collect(),
            None => held.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(perms: &[&str]) -> BTreeSet<String> {
        perms.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn default_catalog_has_four_roles() {
        let catalog = RoleCatalog::default();
        let names: Vec<&str> = catalog.role_names().collect();
        assert_eq!(names, vec!["DevOps", "Developer", "Finance", "HR"]);
    }

    #[test]
    fn excess_is_held_minus_expected() {
        let catalog = RoleCatalog::default();
        let held = set(&["deploy_code", "read_logs", "view_salaries"]);
        assert_eq!(
            catalog.excess("Developer", &held),
            vec!["view_salaries".to_string()]
        );
    }

    #[test]
    fn unknown_role_makes_everything_excess() {
        let catalog = RoleCatalog::default();
        let held = set(&["a", "b"]);
        assert_eq!(
            catalog.excess("Contractor", &held),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
