//! Operator endpoints.
//!
//! - `GET /admin/costs`: current month's spend against the budget

use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Axum extractor that enforces the admin token.
///
/// The token may arrive as `x-admin-key: <token>` or
/// `Authorization: Bearer <token>`.  Both are hashed and compared in constant
/// time against the digest cached at startup.  With no admin token configured
/// every request is refused.
pub struct AdminGuard;

#[async_trait]
impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected_hash) = state.admin_token_hash.as_deref() else {
            return Err(ApiError::Forbidden);
        };

        let provided = parts
            .headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .or_else(|| {
                parts
                    .headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
            })
            .unwrap_or("");

        let provided_hash = Sha256::digest(provided.as_bytes());
        if !bool::from(provided_hash.ct_eq(expected_hash)) {
            tracing::warn!("admin request rejected");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminGuard)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /admin/costs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn costs(_guard: AdminGuard, State(state): State<AppState>) -> impl IntoResponse {
    let status = state.metering.budget_status();
    Json(serde_json::json!({
        "month": status.month,
        "totalCostUsd": status.total_usd,
        "budgetLimitUsd": status.limit_usd,
        "percentUsed": status.percent_used,
        "byCategory": status.by_category,
        "overBudget": status.over_budget,
    }))
}
