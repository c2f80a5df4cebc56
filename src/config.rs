//! Audit service configuration. Model constants and thresholds are config,
//! not literals scattered through the engine.

use crate::roles::RoleCatalog;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Data directory (permission store)
    pub data_dir: PathBuf,
    /// Scoring-engine parameters
    pub scoring: ScoringConfig,
    /// Audit pass scheduling
    pub schedule: ScheduleConfig,
    /// Uplink: push audit results to a dashboard/SIEM endpoint
    pub uplink: UplinkConfig,
    /// Logging
    pub log: LogConfig,
    /// Role → expected-permission catalog, injected once
    pub roles: RoleCatalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Expected outlier fraction handed to the model
    pub contamination: f64,
    /// RNG seed; pins subsampling and tree construction
    pub seed: u64,
    /// Score above this is elevated (0–100 scale)
    pub elevated_threshold: f64,
    /// Population share below which a permission counts as rare
    pub rare_threshold: f64,
    /// Decision-boundary offset of the score mapping
    pub score_offset: f64,
    /// Scale of the score mapping
    pub score_scale: f64,
    /// Number of trees in the forest
    pub trees: usize,
    /// Per-tree subsample ceiling
    pub sample_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Audit interval in seconds; 0 runs a single pass and exits
    pub interval_secs: u64,
    /// Write computed scores back to the store after each pass
    pub persist_scores: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UplinkConfig {
    pub enabled: bool,
    /// Endpoint URL when enabled
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".creep-audit"),
            scoring: ScoringConfig::default(),
            schedule: ScheduleConfig::default(),
            uplink: UplinkConfig::default(),
            log: LogConfig::default(),
            roles: RoleCatalog::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            contamination: 0.1,
            seed: 42,
            elevated_threshold: 65.0,
            rare_threshold: 0.3,
            score_offset: 0.5,
            score_scale: 100.0,
            trees: 100,
            sample_size: 256,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0,
            persist_scores: true,
        }
    }
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl AuditConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AuditConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}
