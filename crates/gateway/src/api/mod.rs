pub mod admin;
pub mod auth;
pub mod chat;
pub mod diagnose;
pub mod error;
pub mod health;
pub mod identify;
pub mod recommend;
pub mod upload;
pub mod usage;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use fg_domain::Category;
use fg_metering::AdmissionResult;

use crate::api::error::ApiError;
use crate::state::AppState;
use crate::upstream::gemini::TokenUsage;

/// Headroom on top of the image limit for the rest of a multipart body.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full API router.
///
/// Auth is enforced per handler through extractors: [`auth::AuthUser`] for
/// any signed-in caller, [`auth::ProUser`] for routes that spend upstream
/// money, and [`admin::AdminGuard`] for operator endpoints.
pub fn router(state: &AppState) -> Router<AppState> {
    let upload_limit = state.config.server.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let public = Router::new().route("/health", get(health::health));

    let admin = Router::new().route("/admin/costs", get(admin::costs));

    let json_routes = Router::new()
        .route("/api/v1/usage", get(usage::usage))
        .route("/api/v1/chat", post(chat::chat))
        .route("/api/v1/recommend", post(recommend::recommend))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes));

    let upload_routes = Router::new()
        .route("/api/v1/diagnose", post(diagnose::diagnose))
        .route("/api/v1/identify", post(identify::identify))
        .layer(DefaultBodyLimit::max(upload_limit));

    public
        .merge(admin)
        .merge(json_routes)
        .merge(upload_routes)
        .fallback(not_found)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Metering helpers shared by the gated routes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the admission gate for `identity`, turning a denial into the
/// matching error response.
pub(crate) fn admit(state: &AppState, identity: &str, category: Category) -> Result<AdmissionResult, ApiError> {
    let admission = state.metering.admit(identity, category);
    if admission.allowed {
        Ok(admission)
    } else {
        Err(ApiError::Denied(admission))
    }
}

/// Charge the estimated cost of a Gemini call to `bucket`.  Failures are
/// logged and never surface to the caller; the response is already paid for.
pub(crate) fn record_spend(state: &AppState, usage: Option<TokenUsage>, bucket: &str) {
    let Some(usage) = usage else {
        return;
    };
    let cost = state
        .config
        .budget
        .pricing
        .estimate_usd(usage.input, usage.output);
    if state.metering.record_spend(cost, bucket).is_ok() {
        tracing::debug!(
            bucket,
            input_tokens = usage.input,
            output_tokens = usage.output,
            cost_usd = cost,
            "spend recorded"
        );
    }
}
