use serde::{Deserialize, Serialize};

/// Where the gateway finds its signing and admin secrets.
///
/// Both values name environment variables; the secrets themselves never
/// live in the config file.  An unset JWT secret rejects every
/// authenticated request, an unset admin token disables `/admin/*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "d_jwt_secret_env")]
    pub jwt_secret_env: String,
    #[serde(default = "d_admin_token_env")]
    pub admin_token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: d_jwt_secret_env(),
            admin_token_env: d_admin_token_env(),
        }
    }
}

fn d_jwt_secret_env() -> String {
    "FG_JWT_SECRET".into()
}

fn d_admin_token_env() -> String {
    "FG_ADMIN_TOKEN".into()
}
