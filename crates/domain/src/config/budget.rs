use serde::{Deserialize, Serialize};

use crate::category::Category;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Monthly budget
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Global monthly spend ceiling and the buckets spend is recorded under.
///
/// Every [`Category`] is a bucket.  `extra_buckets` adds labels that are
/// accounted separately but share a category's quota (e.g. `diagnose`
/// spends under the `photo` quota).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "d_monthly_limit")]
    pub monthly_limit_usd: f64,
    #[serde(default = "d_extra_buckets")]
    pub extra_buckets: Vec<String>,
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl BudgetConfig {
    /// All bucket labels spend may be recorded under.
    pub fn buckets(&self) -> Vec<String> {
        let mut out: Vec<String> = Category::ALL.iter().map(|c| c.as_str().to_string()).collect();
        for extra in &self.extra_buckets {
            let extra = extra.trim();
            if !extra.is_empty() && !out.iter().any(|b| b == extra) {
                out.push(extra.to_string());
            }
        }
        out
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            monthly_limit_usd: d_monthly_limit(),
            extra_buckets: d_extra_buckets(),
            pricing: PricingConfig::default(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Token pricing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-million-token prices used to turn provider-reported usage into an
/// estimated USD amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "d_input_price")]
    pub input_per_million_usd: f64,
    #[serde(default = "d_output_price")]
    pub output_per_million_usd: f64,
}

impl PricingConfig {
    pub fn estimate_usd(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_per_million_usd
            + output_tokens as f64 * self.output_per_million_usd)
            / 1_000_000.0
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_million_usd: d_input_price(),
            output_per_million_usd: d_output_price(),
        }
    }
}

fn d_monthly_limit() -> f64 {
    100.0
}
fn d_extra_buckets() -> Vec<String> {
    vec!["diagnose".into()]
}
fn d_input_price() -> f64 {
    0.15
}
fn d_output_price() -> f64 {
    0.60
}
