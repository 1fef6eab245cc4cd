//! AppState construction extracted from `main.rs`.

use std::sync::Arc;

use fg_domain::config::{Config, ConfigSeverity};
use fg_metering::{Metering, SharedClock, SystemClock};

use crate::state::{AppState, Secrets};

/// Validate config, start the metering service and return a fully-wired
/// [`AppState`].  Must be called inside a Tokio runtime because the metering
/// sweep is spawned here.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }

    // ── Metering ─────────────────────────────────────────────────────
    let clock: SharedClock = Arc::new(SystemClock);
    let metering = Arc::new(Metering::start(&config, clock.clone()));
    tracing::info!(
        monthly_limit_usd = config.budget.monthly_limit_usd,
        chat = config.quota.chat,
        photo = config.quota.photo,
        recommend = config.quota.recommend,
        "metering ready"
    );

    // ── Secrets & upstream clients ───────────────────────────────────
    let secrets = Secrets::from_env(&config);
    AppState::new(config, metering, clock, secrets)
}
