use std::sync::Arc;
use std::time::Instant;

use sha2::{Digest, Sha256};

use fg_domain::config::Config;
use fg_metering::{Metering, SharedClock};

use crate::upstream::gemini::GeminiClient;
use crate::upstream::plantnet::PlantNetClient;

/// Secrets resolved from the environment at startup.
///
/// Kept out of [`Config`] so `config show` can never print them.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub jwt_secret: Option<String>,
    pub admin_token: Option<String>,
    pub gemini_api_key: Option<String>,
    pub plantnet_api_key: Option<String>,
}

impl Secrets {
    /// Read every secret from the env var its config section names.  Unset
    /// and empty variables both count as missing.
    pub fn from_env(config: &Config) -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            jwt_secret: read(&config.auth.jwt_secret_env),
            admin_token: read(&config.auth.admin_token_env),
            gemini_api_key: read(&config.upstream.gemini.api_key_env),
            plantnet_api_key: read(&config.upstream.plantnet.api_key_env),
        }
    }
}

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    // ── Core ──────────────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub metering: Arc<Metering>,
    pub clock: SharedClock,

    // ── Upstream providers ────────────────────────────────────────────
    pub gemini: Arc<GeminiClient>,
    pub plantnet: Arc<PlantNetClient>,

    // ── Security ──────────────────────────────────────────────────────
    /// HS256 signing secret.  `None` means every authenticated route is
    /// refused.
    pub jwt_secret: Option<Arc<[u8]>>,
    /// SHA-256 of the admin token.  `None` disables `/admin/*`.
    pub admin_token_hash: Option<Vec<u8>>,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        metering: Arc<Metering>,
        clock: SharedClock,
        secrets: Secrets,
    ) -> anyhow::Result<Self> {
        let gemini = GeminiClient::new(&config.upstream.gemini, secrets.gemini_api_key)?;
        let plantnet = PlantNetClient::new(&config.upstream.plantnet, secrets.plantnet_api_key)?;

        if !gemini.is_configured() {
            tracing::warn!(
                env = %config.upstream.gemini.api_key_env,
                "Gemini API key not set; chat, recommend and diagnose will fail"
            );
        }
        if !plantnet.is_configured() {
            tracing::warn!(
                env = %config.upstream.plantnet.api_key_env,
                "PlantNet API key not set; identify will fail"
            );
        }

        let jwt_secret = secrets.jwt_secret.map(|s| Arc::<[u8]>::from(s.into_bytes()));
        if jwt_secret.is_none() {
            tracing::warn!(
                env = %config.auth.jwt_secret_env,
                "JWT secret not set; all authenticated requests will be rejected"
            );
        }

        let admin_token_hash = secrets
            .admin_token
            .map(|t| Sha256::digest(t.as_bytes()).to_vec());
        if admin_token_hash.is_none() {
            tracing::info!("admin token not set; /admin endpoints disabled");
        }

        Ok(Self {
            config,
            metering,
            clock,
            gemini: Arc::new(gemini),
            plantnet: Arc::new(plantnet),
            jwt_secret,
            admin_token_hash,
            started_at: Instant::now(),
        })
    }
}
