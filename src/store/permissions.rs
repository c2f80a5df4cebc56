//! SQLite-backed store of accumulated permissions per user. Grants only
//! accumulate on role changes; revocation is an explicit remediation step.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("corrupt permission payload for {user}: {source}")]
    Payload {
        user: String,
        source: serde_json::Error,
    },
    #[error("unknown user {0}")]
    UnknownUser(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub current_role: String,
    pub permissions: BTreeSet<String>,
    pub risk_score: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

pub struct PermissionStore {
    conn: Mutex<Connection>,
}

impl PermissionStore {
    /// Open or create the DB at path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_permissions (
                username TEXT PRIMARY KEY,
                current_role TEXT NOT NULL,
                permissions TEXT NOT NULL,
                risk_score REAL,
                last_updated TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a user with an initial role and its grants. Existing users are
    /// left untouched (their accumulated set is never reset here).
    pub fn create_user(
        &self,
        username: &str,
        role: &str,
        permissions: &BTreeSet<String>,
    ) -> Result<(), StoreError> {
        let payload = encode_permissions(username, permissions)?;
        self.conn.lock().unwrap().execute(
            "INSERT OR IGNORE INTO user_permissions (username, current_role, permissions, last_updated)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, role, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Role change with creep semantics: the new role's grants are unioned
    /// into the accumulated set; prior grants are never removed. Returns the
    /// accumulated set after the change.
    pub fn apply_role_change(
        &self,
        username: &str,
        new_role: &str,
        new_permissions: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StoreError> {
        let mut record = self
            .get_user(username)?
            .ok_or_else(|| StoreError::UnknownUser(username.to_string()))?;
        record.permissions.extend(new_permissions.iter().cloned());
        let payload = encode_permissions(username, &record.permissions)?;
        self.conn.lock().unwrap().execute(
            "UPDATE user_permissions SET current_role = ?2, permissions = ?3, last_updated = ?4
             WHERE username = ?1",
            params![username, new_role, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(record.permissions)
    }

    /// Remediation: the only path that shrinks an accumulated set. Returns
    /// the set after revocation.
    pub fn revoke_permissions(
        &self,
        username: &str,
        revoked: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StoreError> {
        let mut record = self
            .get_user(username)?
            .ok_or_else(|| StoreError::UnknownUser(username.to_string()))?;
        record.permissions.retain(|p| !revoked.contains(p));
        let payload = encode_permissions(username, &record.permissions)?;
        self.conn.lock().unwrap().execute(
            "UPDATE user_permissions SET permissions = ?2, last_updated = ?3 WHERE username = ?1",
            params![username, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(record.permissions)
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT username, current_role, permissions, risk_score, last_updated
                 FROM user_permissions WHERE username = ?1",
                params![username],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        row.map(decode_record).transpose()
    }

    /// Consistent snapshot for the scoring engine.
    pub fn get_all_user_permissions(
        &self,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, StoreError> {
        Ok(self
            .list_users()?
            .into_iter()
            .map(|r| (r.username, r.permissions))
            .collect())
    }

    /// Idempotent: repeated writes of the same score for the same user are safe.
    pub fn persist_risk_score(&self, username: &str, score: f64) -> Result<(), StoreError> {
        let n = self.conn.lock().unwrap().execute(
            "UPDATE user_permissions SET risk_score = ?2 WHERE username = ?1",
            params![username, score],
        )?;
        if n == 0 {
            return Err(StoreError::UnknownUser(username.to_string()));
        }
        Ok(())
    }

    pub fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT username, current_role, permissions, risk_score, last_updated
             FROM user_permissions ORDER BY username",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(decode_record(row?)?);
        }
        Ok(out)
    }
}

fn encode_permissions(user: &str, permissions: &BTreeSet<String>) -> Result<String, StoreError> {
    serde_json::to_string(permissions).map_err(|source| StoreError::Payload {
        user: user.to_string(),
        source,
    })
}

fn decode_record(
    (username, current_role, payload, risk_score, ts): (String, String, String, Option<f64>, String),
) -> Result<UserRecord, StoreError> {
    let permissions =
        serde_json::from_str(&payload).map_err(|source| StoreError::Payload {
            user: username.clone(),
            source,
        })?;
    let last_updated = DateTime::parse_from_rfc3339(&ts)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default();
    Ok(UserRecord {
        username,
        current_role,
        permissions,
        risk_score,
        last_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(perms: &[&str]) -> BTreeSet<String> {
        perms.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn role_change_accumulates_grants() {
        let store = PermissionStore::open_in_memory().unwrap();
        store
            .create_user("atharv", "intern", &set(&["read_docs"]))
            .unwrap();
        let after = store
            .apply_role_change("atharv", "Developer", &set(&["deploy_code", "read_logs"]))
            .unwrap();
        assert_eq!(after, set(&["deploy_code", "read_docs", "read_logs"]));

        let rec = store.get_user("atharv").unwrap().unwrap();
        assert_eq!(rec.current_role, "Developer");
        assert_eq!(rec.permissions, after);
    }

    #[test]
    fn revocation_is_the_only_shrink_path() {
        let store = PermissionStore::open_in_memory().unwrap();
        store.create_user("u", "HR", &set(&["a", "b", "c"])).unwrap();
        let after = store.revoke_permissions("u", &set(&["b"])).unwrap();
        assert_eq!(after, set(&["a", "c"]));
    }

    #[test]
    fn risk_score_writes_are_idempotent() {
        let store = PermissionStore::open_in_memory().unwrap();
        store.create_user("u", "HR", &set(&["a"])).unwrap();
        store.persist_risk_score("u", 72.5).unwrap();
        store.persist_risk_score("u", 72.5).unwrap();
        let rec = store.get_user("u").unwrap().unwrap();
        assert_eq!(rec.risk_score, Some(72.5));
    }

    #[test]
    fn unknown_user_errors_are_explicit() {
        let store = PermissionStore::open_in_memory().unwrap();
        assert!(matches!(
            store.apply_role_change("ghost", "HR", &set(&["a"])),
            Err(StoreError::UnknownUser(_))
        ));
        assert!(matches!(
            store.persist_risk_score("ghost", 1.0),
            Err(StoreError::UnknownUser(_))
        ));
    }

    #[test]
    fn snapshot_covers_every_user() {
        let store = PermissionStore::open_in_memory().unwrap();
        store.create_user("a", "HR", &set(&["x"])).unwrap();
        store.create_user("b", "HR", &set(&[])).unwrap();
        let snap = store.get_all_user_permissions().unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap["a"], set(&["x"]));
        assert!(snap["b"].is_empty());
    }
}
