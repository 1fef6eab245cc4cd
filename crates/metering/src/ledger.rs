//! Monthly spend accumulation.
//!
//! [`CostLedger`] adds estimated USD amounts to the current UTC month and
//! reports whether the month has reached a ceiling.  A new month starts a
//! fresh zero record; earlier months stay readable through
//! [`CostLedger::month_totals`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::Mutex;
use serde::Serialize;

use crate::clock::{MonthKey, SharedClock};
use crate::error::MeteringError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotals {
    pub total_usd: f64,
    pub by_category: BTreeMap<String, f64>,
}

/// Budget report for the current month.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub month: MonthKey,
    pub over_budget: bool,
    /// Rounded to 4 decimals for display.
    pub total_usd: f64,
    pub limit_usd: f64,
    pub percent_used: f64,
    pub by_category: BTreeMap<String, f64>,
}

pub struct CostLedger {
    clock: SharedClock,
    buckets: BTreeSet<String>,
    months: Mutex<HashMap<MonthKey, MonthTotals>>,
}

impl CostLedger {
    /// `buckets` is the closed set of labels spend may be recorded under.
    pub fn new<I, S>(buckets: I, clock: SharedClock) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clock,
            buckets: buckets.into_iter().map(Into::into).collect(),
            months: Mutex::new(HashMap::new()),
        }
    }

    /// Add `amount_usd` to the current month under `bucket`.
    ///
    /// Negative, NaN or infinite amounts and unknown buckets are refused
    /// before any state is touched.
    pub fn record(&self, amount_usd: f64, bucket: &str) -> Result<(), MeteringError> {
        if !amount_usd.is_finite() || amount_usd < 0.0 {
            return Err(MeteringError::InvalidAmount(amount_usd));
        }
        if !self.buckets.contains(bucket) {
            return Err(MeteringError::UnknownBucket(bucket.to_owned()));
        }

        let month = MonthKey::of(self.clock.now());
        let mut months = self.months.lock();
        let totals = months.entry(month).or_default();
        totals.total_usd += amount_usd;
        *totals.by_category.entry(bucket.to_owned()).or_insert(0.0) += amount_usd;
        Ok(())
    }

    /// Current month's spend against `limit_usd`.
    ///
    /// `over_budget` is true once the total is at or above the limit.
    pub fn status(&self, limit_usd: f64) -> BudgetStatus {
        let month = MonthKey::of(self.clock.now());
        let totals = self.months.lock().get(&month).cloned().unwrap_or_default();

        let percent_used = if limit_usd > 0.0 {
            round_to(totals.total_usd / limit_usd * 100.0, 2)
        } else {
            100.0
        };

        BudgetStatus {
            month,
            over_budget: totals.total_usd >= limit_usd,
            total_usd: round_to(totals.total_usd, 4),
            limit_usd,
            percent_used,
            by_category: totals.by_category,
        }
    }

    /// Raw totals for any month that has seen spend.
    pub fn month_totals(&self, month: MonthKey) -> Option<MonthTotals> {
        self.months.lock().get(&month).cloned()
    }

    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(String::as_str)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
