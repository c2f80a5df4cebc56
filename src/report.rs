//! Presentation-layer views over engine output: four-way severity tiers,
//! excess permissions per user, and a per-pass summary. Bucketing here is
//! display logic, not part of the engine contract.

use crate::risk::{Reason, RiskResult, RiskStatus};
use crate::roles::RoleCatalog;
use crate::store::UserRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityTier {
    /// Dashboard buckets over the 0–100 score. The engine contract is only
    /// the two-valued status; these edges exist for display.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            SeverityTier::Critical
        } else if score > 65.0 {
            SeverityTier::High
        } else if score > 40.0 {
            SeverityTier::Medium
        } else {
            SeverityTier::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReportRow {
    pub username: String,
    pub current_role: String,
    pub permission_count: usize,
    /// Held permissions beyond the current role's expected set
    pub excess_permissions: Vec<String>,
    pub risk_score: f64,
    pub status: RiskStatus,
    pub tier: SeverityTier,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub generated_at: DateTime<Utc>,
    pub total_users: usize,
    pub elevated_users: usize,
    pub tier_counts: BTreeMap<SeverityTier, usize>,
}

/// One report row per stored user, joining store records with scoring
/// results and the injected role catalog.
pub fn build_report(
    records: &[UserRecord],
    results: &BTreeMap<String, RiskResult>,
    catalog: &RoleCatalog,
) -> Vec<UserReportRow> {
    records
        .iter()
        .map(|rec| {
            let result = results.get(&rec.username).cloned().unwrap_or_else(|| {
                RiskResult::fallback(rec.username.clone(), Reason::NoPermissions)
            });
            UserReportRow {
                username: rec.username.clone(),
                current_role: rec.current_role.clone(),
                permission_count: rec.permissions.len(),
                excess_permissions: catalog.excess(&rec.current_role, &rec.permissions),
                risk_score: result.risk_score,
                status: result.status,
                tier: SeverityTier::from_score(result.risk_score),
                reason: result.reason.to_string(),
            }
        })
        .collect()
}

pub fn summarize(results: &BTreeMap<String, RiskResult>) -> AuditSummary {
    let mut tier_counts = BTreeMap::new();
    let mut elevated_users = 0;
    for r in results.values() {
        *tier_counts
            .entry(SeverityTier::from_score(r.risk_score))
            .or_insert(0) += 1;
        if r.status == RiskStatus::Elevated {
            elevated_users += 1;
        }
    }
    AuditSummary {
        generated_at: Utc::now(),
        total_users: results.len(),
        elevated_users,
        tier_counts,
    }
}
