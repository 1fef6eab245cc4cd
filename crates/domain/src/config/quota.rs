use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Per-identity daily ceilings, one per [`Category`].
///
/// A ceiling of `0` closes the category entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default = "d_chat")]
    pub chat: u32,
    #[serde(default = "d_photo")]
    pub photo: u32,
    #[serde(default = "d_recommend")]
    pub recommend: u32,
    /// How often stale day records are swept from the quota store.
    #[serde(default = "d_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl QuotaConfig {
    pub fn limit_for(&self, category: Category) -> u32 {
        match category {
            Category::Chat => self.chat,
            Category::Photo => self.photo,
            Category::Recommend => self.recommend,
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            chat: d_chat(),
            photo: d_photo(),
            recommend: d_recommend(),
            sweep_interval_secs: d_sweep_interval(),
        }
    }
}

fn d_chat() -> u32 {
    20
}
fn d_photo() -> u32 {
    10
}
fn d_recommend() -> u32 {
    3
}
fn d_sweep_interval() -> u64 {
    3_600
}
