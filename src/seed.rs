//! Demo seeder: users that moved through 2–3 roles with accumulated grants,
//! the pattern the scoring engine is meant to surface.

use crate::roles::RoleCatalog;
use crate::store::{PermissionStore, StoreError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Seed `count` users. Each passes through 2–3 roles drawn from the catalog;
/// the accumulated set is the union across the history and the current role
/// is the last one. Deterministic for a fixed seed.
pub fn seed_demo_users(
    store: &PermissionStore,
    catalog: &RoleCatalog,
    count: usize,
    seed: u64,
) -> Result<Vec<String>, StoreError> {
    if catalog.is_empty() {
        return Ok(Vec::new());
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let roles: Vec<&str> = catalog.role_names().collect();

    let mut created = Vec::with_capacity(count);
    for i in 1..=count {
        let username = format!("user_{:02}", i);
        let take = rng.gen_range(2..=3).min(roles.len()).max(1);
        let history: Vec<&str> = roles.choose_multiple(&mut rng, take).copied().collect();

        let initial = catalog.expected(history[0]).cloned().unwrap_or_default();
        store.create_user(&username, history[0], &initial)?;
        for role in &history[1..] {
            let grants = catalog.expected(role).cloned().unwrap_or_default();
            store.apply_role_change(&username, role, &grants)?;
        }
        created.push(username);
    }
    info!(count = created.len(), "seeded demo users");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_deterministic_and_accumulates() {
        let store = PermissionStore::open_in_memory().unwrap();
        let catalog = RoleCatalog::default();
        let users = seed_demo_users(&store, &catalog, 10, 42).unwrap();
        assert_eq!(users.len(), 10);

        let store2 = PermissionStore::open_in_memory().unwrap();
        seed_demo_users(&store2, &catalog, 10, 42).unwrap();
        assert_eq!(
            store.get_all_user_permissions().unwrap(),
            store2.get_all_user_permissions().unwrap()
        );

        // Every user went through at least two roles, so holds more grants
        // than any single role hands out.
        for rec in store.list_users().unwrap() {
            assert!(rec.permissions.len() >= 3);
        }
    }
}
