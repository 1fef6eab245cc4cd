mod auth;
mod budget;
mod cache;
mod observability;
mod quota;
mod server;
mod upstream;

pub use auth::*;
pub use budget::*;
pub use cache::*;
pub use observability::*;
pub use quota::*;
pub use server::*;
pub use upstream::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Longest cache TTL `validate` accepts.
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.  Secrets are only
    /// checked for presence in the environment, never read into the report.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "concurrency limit must be greater than 0",
            ));
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        if !self.budget.monthly_limit_usd.is_finite() || self.budget.monthly_limit_usd < 0.0 {
            errors.push(ConfigError::error(
                "budget.monthly_limit_usd",
                "monthly limit must be a non-negative number",
            ));
        }
        for (field, rate) in [
            ("budget.pricing.input_per_million_usd", self.budget.pricing.input_per_million_usd),
            ("budget.pricing.output_per_million_usd", self.budget.pricing.output_per_million_usd),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                errors.push(ConfigError::error(field, "price must be a non-negative number"));
            }
        }
        for (i, bucket) in self.budget.extra_buckets.iter().enumerate() {
            if bucket.trim().is_empty() {
                errors.push(ConfigError::error(
                    format!("budget.extra_buckets[{i}]"),
                    "bucket name must not be empty",
                ));
            }
        }

        if self.cache.ttl_secs == 0 {
            errors.push(ConfigError::error("cache.ttl_secs", "ttl must be greater than 0"));
        } else if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            errors.push(ConfigError::error(
                "cache.ttl_secs",
                format!("ttl must not exceed {MAX_CACHE_TTL_SECS} seconds (365 days)"),
            ));
        }
        if self.quota.sweep_interval_secs == 0 {
            errors.push(ConfigError::error(
                "quota.sweep_interval_secs",
                "sweep interval must be greater than 0",
            ));
        }

        if self.upstream.gemini.base_url.is_empty() {
            errors.push(ConfigError::error(
                "upstream.gemini.base_url",
                "base_url must not be empty",
            ));
        }
        if self.upstream.plantnet.base_url.is_empty() {
            errors.push(ConfigError::error(
                "upstream.plantnet.base_url",
                "base_url must not be empty",
            ));
        }

        // Missing secrets degrade individual routes, they do not stop startup.
        for (field, env) in [
            ("auth.jwt_secret_env", &self.auth.jwt_secret_env),
            ("auth.admin_token_env", &self.auth.admin_token_env),
            ("upstream.gemini.api_key_env", &self.upstream.gemini.api_key_env),
            ("upstream.plantnet.api_key_env", &self.upstream.plantnet.api_key_env),
        ] {
            if env_is_blank(env) {
                errors.push(ConfigError::warning(
                    field,
                    format!("environment variable {env} is not set"),
                ));
            }
        }

        errors
    }
}

fn env_is_blank(name: &str) -> bool {
    std::env::var(name).map(|v| v.is_empty()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_only(cfg: &Config) -> Vec<ConfigError> {
        cfg.validate()
            .into_iter()
            .filter(|e| e.severity == ConfigSeverity::Error)
            .collect()
    }

    #[test]
    fn default_config_has_no_errors() {
        assert!(errors_only(&Config::default()).is_empty());
    }

    #[test]
    fn zero_port_is_an_error() {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        let errs = errors_only(&cfg);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "server.port");
    }

    #[test]
    fn zero_concurrency_limit_is_an_error() {
        let mut cfg = Config::default();
        cfg.server.max_concurrent_requests = 0;
        let errs = errors_only(&cfg);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "server.max_concurrent_requests");
    }

    #[test]
    fn negative_budget_is_an_error() {
        let mut cfg = Config::default();
        cfg.budget.monthly_limit_usd = -1.0;
        assert!(errors_only(&cfg)
            .iter()
            .any(|e| e.field == "budget.monthly_limit_usd"));
    }

    #[test]
    fn zero_ttl_is_an_error() {
        let mut cfg = Config::default();
        cfg.cache.ttl_secs = 0;
        assert!(errors_only(&cfg).iter().any(|e| e.field == "cache.ttl_secs"));
    }

    #[test]
    fn oversized_ttl_is_an_error() {
        let mut cfg = Config::default();
        cfg.cache.ttl_secs = MAX_CACHE_TTL_SECS;
        assert!(errors_only(&cfg).is_empty());

        cfg.cache.ttl_secs = u64::MAX;
        let errs = errors_only(&cfg);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "cache.ttl_secs");
    }

    #[test]
    fn blank_bucket_is_an_error() {
        let mut cfg = Config::default();
        cfg.budget.extra_buckets.push("  ".into());
        assert!(errors_only(&cfg)
            .iter()
            .any(|e| e.field == "budget.extra_buckets[1]"));
    }

    #[test]
    fn wildcard_cors_is_only_a_warning() {
        let mut cfg = Config::default();
        cfg.server.cors.allowed_origins = vec!["*".into()];
        let issues = cfg.validate();
        let cors = issues
            .iter()
            .find(|e| e.field == "server.cors.allowed_origins")
            .unwrap();
        assert_eq!(cors.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn display_includes_severity_tag() {
        let e = ConfigError::error("server.port", "bad");
        assert_eq!(e.to_string(), "[ERROR] server.port: bad");
    }
}
