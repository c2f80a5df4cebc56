//! Uplink client: push audit results to a dashboard/SIEM endpoint.

use crate::config::UplinkConfig;
use crate::report::{AuditSummary, UserReportRow};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Serialize)]
struct AuditPayload<'a> {
    run_id: &'a str,
    summary: &'a AuditSummary,
    users: &'a [UserReportRow],
}

pub struct UplinkClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl UplinkClient {
    pub fn new(config: &UplinkConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let endpoint = config.endpoint.as_ref()?.trim_end_matches('/').to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .ok()?;
        Some(Self {
            client,
            base_url: endpoint,
        })
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), String> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().unwrap_or_default();
            return Err(format!("{} {}", status, text));
        }
        Ok(())
    }

    /// Report one audit pass. Failures are logged, never fatal to the audit.
    pub fn report(&self, run_id: &str, summary: &AuditSummary, users: &[UserReportRow]) {
        let payload = AuditPayload {
            run_id,
            summary,
            users,
        };
        match self.post("/api/v1/audits", &payload) {
            Ok(()) => info!(run_id, users = users.len(), "uplink audit reported"),
            Err(e) => warn!(run_id, error = %e, "uplink audit report failed"),
        }
    }
}
