use axum::extract::State;
use axum::response::{IntoResponse, Json};

use fg_metering::Clock as _;

use crate::state::AppState;

/// `GET /health`: liveness probe (public, no auth).
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": state.config.observability.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": state.clock.now(),
        "uptime": state.started_at.elapsed().as_secs(),
    }))
}
