use chrono::{DateTime, Utc};

use fg_domain::config::Config;

use crate::api::auth::{issue_token, TokenClaims};
use crate::state::Secrets;

/// Sign a token for `user` with the secret from the configured env var.
pub fn issue(config: &Config, user: &str, pro: bool, ttl_secs: i64) -> anyhow::Result<String> {
    let secret = Secrets::from_env(config).jwt_secret.ok_or_else(|| {
        anyhow::anyhow!("{} is not set; cannot sign a token", config.auth.jwt_secret_env)
    })?;
    sign(user, pro, ttl_secs, secret.as_bytes(), Utc::now())
}

fn sign(user: &str, pro: bool, ttl_secs: i64, secret: &[u8], now: DateTime<Utc>) -> anyhow::Result<String> {
    if ttl_secs <= 0 {
        anyhow::bail!("--ttl-secs must be positive");
    }
    let claims = TokenClaims {
        user_id: user.to_owned(),
        is_pro: pro,
        iat: now.timestamp(),
        exp: now.timestamp() + ttl_secs,
    };
    Ok(issue_token(&claims, secret)?)
}
