//! `POST /api/v1/recommend`: monthly planting recommendations.
//!
//! The base recommendation depends only on zone and month, so it is cached
//! per `zone:YYYY-MM` and shared across users.  Each caller's existing plants
//! are appended afterwards, never written back into the cache.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use chrono::Datelike;
use serde::Deserialize;

use fg_domain::Category;
use fg_metering::cache::scope_key;
use fg_metering::Clock as _;

use crate::api::auth::ProUser;
use crate::api::error::{rate_limit_headers, ApiError, RECOMMEND_MESSAGES};
use crate::api::{admit, record_spend};
use crate::prompts::recommend_prompt;
use crate::state::AppState;
use crate::upstream::gemini::{GenerateRequest, Turn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub existing_plants: Vec<String>,
    #[serde(default)]
    pub garden_size: Option<String>,
}

impl RecommendRequest {
    fn validated(&self) -> Result<(&str, u32), ApiError> {
        let zone = self.zone.as_deref().map(str::trim).filter(|z| !z.is_empty());
        let (Some(zone), Some(month)) = (zone, self.month) else {
            return Err(ApiError::bad_request("Zone and month are required"));
        };
        if !(1..=12).contains(&month) {
            return Err(ApiError::bad_request("Month must be between 1 and 12"));
        }
        Ok((zone, month))
    }
}

pub async fn recommend(
    ProUser(user): ProUser,
    State(state): State<AppState>,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let (zone, month) = req.validated()?;

    let admission = admit(&state, &user.user_id, Category::Recommend)?;
    let key = scope_key(zone, state.clock.now().year(), month);

    let (base, cached) = match state.metering.cache_lookup(&key) {
        Some(base) => {
            tracing::debug!(scope = %key, "recommendation cache hit");
            (base, true)
        }
        None => {
            let request = GenerateRequest {
                system: None,
                turns: vec![Turn::user_text(recommend_prompt(
                    zone,
                    month,
                    req.garden_size.as_deref(),
                ))],
                temperature: 0.6,
                timeout: None,
            };
            let generation = state
                .gemini
                .generate(&request)
                .await
                .map_err(|e| ApiError::upstream(e, RECOMMEND_MESSAGES))?;

            state.metering.cache_store(key.clone(), generation.text.clone());
            record_spend(&state, generation.usage, Category::Recommend.as_str());
            tracing::info!(scope = %key, "recommendation generated and cached");
            (generation.text, false)
        }
    };

    let recommendation = state.metering.personalize(&base, &req.existing_plants);

    Ok((
        rate_limit_headers(&admission),
        Json(serde_json::json!({
            "recommendation": recommendation,
            "cached": cached,
            "zone": zone,
            "month": month,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(zone: Option<&str>, month: Option<u32>) -> RecommendRequest {
        RecommendRequest {
            zone: zone.map(String::from),
            month,
            existing_plants: Vec::new(),
            garden_size: None,
        }
    }

    #[test]
    fn zone_and_month_are_required() {
        assert!(req(None, Some(3)).validated().is_err());
        assert!(req(Some("  "), Some(3)).validated().is_err());
        assert!(req(Some("7b"), None).validated().is_err());
        assert!(req(Some("7b"), Some(13)).validated().is_err());
        assert!(req(Some("7b"), Some(0)).validated().is_err());
        assert_eq!(req(Some(" 7b "), Some(3)).validated().unwrap(), ("7b", 3));
    }
}
