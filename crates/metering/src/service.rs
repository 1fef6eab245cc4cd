//! The metering service handed to the request layer.
//!
//! [`Metering`] wires the clock, quota store, cost ledger and response cache
//! together and owns the background sweep that prunes stale quota days and
//! expired cache entries.  Start it with [`Metering::start`] inside a Tokio
//! runtime and stop it with [`Metering::shutdown`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fg_domain::config::Config;
use fg_domain::Category;

use crate::cache::ResponseCache;
use crate::clock::SharedClock;
use crate::error::MeteringError;
use crate::gate::{AdmissionGate, AdmissionResult};
use crate::ledger::{BudgetStatus, CostLedger};
use crate::personalize::personalize;
use crate::quota::{CategoryUsage, QuotaStore};

struct Sweeper {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Saturates instead of panicking when `secs` exceeds what `TimeDelta` holds.
fn cache_ttl(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

pub struct Metering {
    gate: AdmissionGate,
    quota: Arc<QuotaStore>,
    cache: Arc<ResponseCache>,
    personalize_max_items: usize,
    sweeper: Mutex<Option<Sweeper>>,
}

impl Metering {
    /// Build every store without starting the sweep.  Useful in tests and
    /// one-shot tools that never run long enough to need pruning.
    pub fn new(config: &Config, clock: SharedClock) -> Self {
        let quota = Arc::new(QuotaStore::new(config.quota.clone(), clock.clone()));
        let ledger = CostLedger::new(config.budget.buckets(), clock.clone());
        let cache = Arc::new(ResponseCache::new(cache_ttl(config.cache.ttl_secs), clock));

        Self {
            gate: AdmissionGate::new(ledger, quota.clone(), config.budget.monthly_limit_usd),
            quota,
            cache,
            personalize_max_items: config.cache.personalize_max_items,
            sweeper: Mutex::new(None),
        }
    }

    /// Build the stores and spawn the periodic sweep on the current runtime.
    pub fn start(config: &Config, clock: SharedClock) -> Self {
        let metering = Self::new(config, clock);
        let every = Duration::from_secs(config.quota.sweep_interval_secs.max(1));
        metering.spawn_sweeper(every);
        metering
    }

    fn spawn_sweeper(&self, every: Duration) {
        let cancel = CancellationToken::new();
        let quota = self.quota.clone();
        let cache = self.cache.clone();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately; skip it.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let days = quota.sweep();
                        let entries = cache.purge_expired();
                        if days > 0 || entries > 0 {
                            tracing::debug!(
                                quota_records = days,
                                cache_entries = entries,
                                "metering sweep removed stale state"
                            );
                        }
                    }
                }
            }
        });

        tracing::info!(interval_secs = every.as_secs(), "metering sweep started");
        *self.sweeper.lock() = Some(Sweeper { cancel, task });
    }

    /// Stop the background sweep and wait for it to finish.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(Sweeper { cancel, task }) = sweeper {
            cancel.cancel();
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "metering sweep task ended abnormally");
            }
            tracing::info!("metering sweep stopped");
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    // ── Request-path operations ──────────────────────────────────────

    pub fn admit(&self, identity: &str, category: Category) -> AdmissionResult {
        self.gate.admit(identity, category)
    }

    pub fn cache_lookup(&self, scope_key: &str) -> Option<String> {
        self.cache.get(scope_key)
    }

    pub fn cache_store(&self, scope_key: impl Into<String>, payload: impl Into<String>) {
        self.cache.put(scope_key, payload);
    }

    /// Personalize a base payload with the configured item cap.
    pub fn personalize(&self, base: &str, extras: &[String]) -> String {
        personalize(base, extras, self.personalize_max_items)
    }

    pub fn record_spend(&self, amount_usd: f64, bucket: &str) -> Result<(), MeteringError> {
        self.gate.record_spend(amount_usd, bucket)
    }

    // ── Reports ──────────────────────────────────────────────────────

    pub fn usage_snapshot(&self, identity: &str) -> BTreeMap<Category, CategoryUsage> {
        self.gate.usage_snapshot(identity)
    }

    pub fn budget_status(&self) -> BudgetStatus {
        self.gate.budget_status()
    }

    pub fn ledger(&self) -> &CostLedger {
        self.gate.ledger()
    }

    pub fn quota(&self) -> &QuotaStore {
        &self.quota
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

impl Drop for Metering {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 1, 6, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn start_and_shutdown_sweeper() {
        let metering = Metering::start(&Config::default(), clock());
        assert!(metering.is_sweeping());
        metering.shutdown().await;
        assert!(!metering.is_sweeping());
        // Second shutdown is a no-op.
        metering.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_prunes_stale_days() {
        let clock = clock();
        let mut config = Config::default();
        config.quota.sweep_interval_secs = 60;
        let metering = Metering::start(&config, clock.clone());

        metering.admit("u1", Category::Chat);
        clock.advance(chrono::Duration::days(1));
        assert_eq!(metering.quota().len(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert_eq!(metering.quota().len(), 0);

        metering.shutdown().await;
    }

    #[test]
    fn oversized_ttl_saturates() {
        assert_eq!(cache_ttl(60), TimeDelta::seconds(60));
        assert_eq!(cache_ttl(u64::MAX), TimeDelta::MAX);
        assert_eq!(cache_ttl(i64::MAX as u64), TimeDelta::MAX);

        let mut config = Config::default();
        config.cache.ttl_secs = u64::MAX;
        let metering = Metering::new(&config, clock());
        metering.cache_store("7b:2026-05", "base");
        assert_eq!(metering.cache_lookup("7b:2026-05").as_deref(), Some("base"));
    }

    #[test]
    fn personalize_uses_configured_cap() {
        let mut config = Config::default();
        config.cache.personalize_max_items = 1;
        let metering = Metering::new(&config, clock());
        let out = metering.personalize("base", &["kale".into(), "leek".into()]);
        assert!(out.contains("kale"));
        assert!(!out.contains("leek"));
    }
}
