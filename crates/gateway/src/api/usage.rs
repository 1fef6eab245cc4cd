//! `GET /api/v1/usage`: today's per-category usage for the caller, so the
//! app can show how many requests are left.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::api::auth::AuthUser;
use crate::state::AppState;

pub async fn usage(user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    let usage = state.metering.usage_snapshot(&user.user_id);
    Json(serde_json::json!({
        "userId": user.user_id,
        "usage": usage,
    }))
}
