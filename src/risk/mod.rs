//! Risk scoring: model output → bounded 0–100 score, status, and reason.

mod engine;
mod explain;

pub use engine::{Reason, RiskEngine, RiskResult, RiskStatus};
pub use explain::explain;
