//! Creep Audit — privilege-creep detection over accumulated permissions.
//!
//! Modular structure:
//! - [`store`] — Permission-accumulation store (SQLite, keyed by username)
//! - [`features`] — Binary permission membership matrix builder
//! - [`model`] — Seeded isolation-forest outlier detection
//! - [`risk`] — Risk scoring engine and explanation extractor
//! - [`roles`] — Role → expected-permission catalog
//! - [`report`] — Severity tiers and audit summaries (presentation)
//! - [`audit`] — One audit pass: snapshot → matrix → scores → persist
//! - [`uplink`] — Optional HTTP reporting of audit results
//! - [`logging`] — Structured JSON logging

pub mod audit;
pub mod config;
pub mod features;
pub mod logging;
pub mod model;
pub mod report;
pub mod risk;
pub mod roles;
pub mod seed;
pub mod store;
pub mod uplink;

pub use audit::AuditRun;
pub use config::AuditConfig;
pub use features::{FeatureMatrix, NoSignal};
pub use logging::StructuredLogger;
pub use model::IsolationForest;
pub use risk::{Reason, RiskEngine, RiskResult, RiskStatus};
pub use roles::RoleCatalog;
pub use store::PermissionStore;
