use serde::{Deserialize, Serialize};

/// Shared response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum age of a cached base payload.  Default: 7 days.
    #[serde(default = "d_ttl")]
    pub ttl_secs: u64,
    /// How many caller-supplied items the personalization note lists.
    #[serde(default = "d_personalize_max")]
    pub personalize_max_items: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: d_ttl(),
            personalize_max_items: d_personalize_max(),
        }
    }
}

fn d_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn d_personalize_max() -> usize {
    10
}
