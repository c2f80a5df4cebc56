//! Creep-audit entrypoint: runs a single audit pass or a daemon loop with a
//! configurable interval; `seed` populates demo users. When uplink is
//! enabled, audit results are pushed to the dashboard API.

use creep_audit::{
    audit,
    config::AuditConfig,
    logging::{LogEvent, StructuredLogger},
    report::{self, SeverityTier},
    risk::{RiskEngine, RiskStatus},
    seed,
    store::PermissionStore,
    uplink::UplinkClient,
};
use chrono::Utc;
use std::time::Duration;
use tracing::info;

fn status_str(status: RiskStatus) -> &'static str {
    match status {
        RiskStatus::Elevated => "elevated",
        RiskStatus::Nominal => "nominal",
    }
}

fn run_one_cycle(
    store: &PermissionStore,
    engine: &RiskEngine,
    config: &AuditConfig,
    uplink: Option<&UplinkClient>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let run = audit::run_audit(store, engine, config.schedule.persist_scores)?;
    let records = store.list_users()?;
    let rows = report::build_report(&records, &run.results, &config.roles);
    let summary = report::summarize(&run.results);

    let mut stdout = std::io::stdout();
    for row in rows.iter().filter(|r| r.tier >= SeverityTier::High) {
        let event = LogEvent {
            ts: Utc::now().to_rfc3339(),
            level: "warn",
            message: "elevated user",
            run_id: Some(&run.id),
            user: Some(&row.username),
            risk_score: Some(row.risk_score),
            status: Some(status_str(row.status)),
            reason: Some(&row.reason),
            error: None,
        };
        StructuredLogger::emit_json(&event, &mut stdout);
    }
    info!(
        run_id = %run.id,
        total = summary.total_users,
        elevated = summary.elevated_users,
        "audit summary"
    );

    if let Some(u) = uplink {
        u.report(&run.id, &summary, &rows);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("CREEP_AUDIT_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = AuditConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(data_dir = ?config.data_dir, "creep-audit starting");

    std::fs::create_dir_all(&config.data_dir)?;
    let store_path = config.data_dir.join("audit.db");
    let store = PermissionStore::open(&store_path)?;
    let engine = RiskEngine::new(config.scoring.clone());
    let uplink = UplinkClient::new(&config.uplink);

    if std::env::args().nth(1).as_deref() == Some("seed") {
        let users = seed::seed_demo_users(&store, &config.roles, 20, config.scoring.seed)?;
        info!(count = users.len(), "seed complete");
        return Ok(());
    }

    let interval_secs = config.schedule.interval_secs;
    if interval_secs > 0 {
        info!(interval_secs, "daemon mode (Ctrl+C to stop)");
        static STOP: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
        let _ = ctrlc::set_handler(|| {
            STOP.store(true, std::sync::atomic::Ordering::Relaxed);
        });
        let mut cycle: u64 = 0;
        while !STOP.load(std::sync::atomic::Ordering::Relaxed) {
            cycle += 1;
            if let Err(e) = run_one_cycle(&store, &engine, &config, uplink.as_ref()) {
                tracing::warn!(cycle, error = %e, "cycle failed");
            }
            for _ in 0..interval_secs {
                if STOP.load(std::sync::atomic::Ordering::Relaxed) {
                    break;
                }
                std::thread::sleep(Duration::from_secs(1));
            }
        }
        info!("creep-audit stopping");
    } else {
        run_one_cycle(&store, &engine, &config, uplink.as_ref())?;
        info!("creep-audit cycle complete");
    }

    Ok(())
}
