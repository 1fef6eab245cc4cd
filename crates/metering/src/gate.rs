//! Request admission: global budget breaker first, then per-identity quota.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fg_domain::Category;

use crate::error::MeteringError;
use crate::ledger::{BudgetStatus, CostLedger};
use crate::quota::{CategoryUsage, QuotaStore};

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    /// The monthly spend ceiling has been reached.  Applies to everyone.
    BudgetExceeded,
    /// This identity used up today's allowance for the category.
    QuotaExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResult {
    pub allowed: bool,
    pub reason: Option<Denial>,
    pub category: Category,
    pub limit: u32,
    pub remaining: u32,
    /// Set whenever the quota gate was consulted.
    pub reset_at: Option<DateTime<Utc>>,
}

/// Composes the cost ledger and the quota store into one admission
/// decision.
///
/// The budget check runs first and never touches per-identity state, so a
/// budget rejection needs no rollback.
pub struct AdmissionGate {
    ledger: CostLedger,
    quota: Arc<QuotaStore>,
    monthly_limit_usd: f64,
}

impl AdmissionGate {
    pub fn new(ledger: CostLedger, quota: Arc<QuotaStore>, monthly_limit_usd: f64) -> Self {
        Self {
            ledger,
            quota,
            monthly_limit_usd,
        }
    }

    pub fn admit(&self, identity: &str, category: Category) -> AdmissionResult {
        let budget = self.ledger.status(self.monthly_limit_usd);
        if budget.over_budget {
            tracing::warn!(
                total_usd = budget.total_usd,
                limit_usd = budget.limit_usd,
                month = %budget.month,
                "monthly budget exceeded, rejecting request"
            );
            return AdmissionResult {
                allowed: false,
                reason: Some(Denial::BudgetExceeded),
                category,
                limit: self.quota.limit_for(category),
                remaining: 0,
                reset_at: None,
            };
        }

        let decision = self.quota.check_and_consume(identity, category);
        if !decision.admitted {
            tracing::info!(
                identity,
                category = %category,
                used = decision.used,
                limit = decision.limit,
                "daily quota reached"
            );
        }

        AdmissionResult {
            allowed: decision.admitted,
            reason: (!decision.admitted).then_some(Denial::QuotaExceeded),
            category,
            limit: decision.limit,
            remaining: decision.remaining,
            reset_at: Some(decision.reset_at),
        }
    }

    pub fn record_spend(&self, amount_usd: f64, bucket: &str) -> Result<(), MeteringError> {
        self.ledger.record(amount_usd, bucket).inspect_err(|e| {
            tracing::error!(error = %e, amount_usd, bucket, "spend not recorded");
        })?;
        tracing::debug!(amount_usd, bucket, "spend recorded");
        Ok(())
    }

    pub fn usage_snapshot(&self, identity: &str) -> BTreeMap<Category, CategoryUsage> {
        self.quota.usage_snapshot(identity)
    }

    pub fn budget_status(&self) -> BudgetStatus {
        self.ledger.status(self.monthly_limit_usd)
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }
}
