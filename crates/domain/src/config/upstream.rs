use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Upstream providers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub plantnet: PlantNetConfig,
}

/// Google Gemini `generateContent` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "d_gemini_url")]
    pub base_url: String,
    #[serde(default = "d_gemini_model")]
    pub model: String,
    /// Environment variable holding the API key (sent as `?key=`).
    #[serde(default = "d_gemini_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
    /// Image analysis is slower; diagnose requests get their own timeout.
    #[serde(default = "d_45000")]
    pub vision_timeout_ms: u64,
    #[serde(default = "d_1024")]
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: d_gemini_url(),
            model: d_gemini_model(),
            api_key_env: d_gemini_key_env(),
            timeout_ms: d_30000(),
            vision_timeout_ms: d_45000(),
            max_output_tokens: d_1024(),
        }
    }
}

/// Pl@ntNet identification API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantNetConfig {
    #[serde(default = "d_plantnet_url")]
    pub base_url: String,
    #[serde(default = "d_plantnet_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
    #[serde(default = "d_5")]
    pub max_results: u32,
    #[serde(default = "d_lang")]
    pub lang: String,
}

impl Default for PlantNetConfig {
    fn default() -> Self {
        Self {
            base_url: d_plantnet_url(),
            api_key_env: d_plantnet_key_env(),
            timeout_ms: d_30000(),
            max_results: d_5(),
            lang: d_lang(),
        }
    }
}

fn d_gemini_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_gemini_model() -> String {
    "gemini-2.5-flash-preview-05-20".into()
}
fn d_gemini_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn d_plantnet_url() -> String {
    "https://my-api.plantnet.org".into()
}
fn d_plantnet_key_env() -> String {
    "PLANTNET_API_KEY".into()
}
fn d_lang() -> String {
    "en".into()
}
fn d_30000() -> u64 {
    30_000
}
fn d_45000() -> u64 {
    45_000
}
fn d_1024() -> u32 {
    1024
}
fn d_5() -> u32 {
    5
}
