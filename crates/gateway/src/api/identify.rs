//! `POST /api/v1/identify`: species identification via Pl@ntNet.
//!
//! Counts against the `photo` quota.  Pl@ntNet is not billed per token, so
//! nothing is charged to the cost ledger.

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Json};

use fg_domain::error::Error;
use fg_domain::Category;

use crate::api::admit;
use crate::api::auth::ProUser;
use crate::api::error::{rate_limit_headers, ApiError, IDENTIFY_MESSAGES};
use crate::api::upload::read_photo_form;
use crate::state::AppState;

pub const ORGANS: [&str; 5] = ["auto", "leaf", "flower", "fruit", "bark"];

const NO_MATCH_HINT: &str =
    "No plant species matched. Try a clearer photo of the leaves or flowers.";

pub async fn identify(
    ProUser(user): ProUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = read_photo_form(multipart, state.config.server.max_upload_bytes).await?;
    let image = form.require_image()?;

    let organs = form.field("organs").unwrap_or("auto").to_owned();
    if !ORGANS.contains(&organs.as_str()) {
        return Err(ApiError::bad_request(format!(
            "organs must be one of: {}",
            ORGANS.join(", ")
        )));
    }

    let admission = admit(&state, &user.user_id, Category::Photo)?;
    let headers = rate_limit_headers(&admission);

    let results = match state.plantnet.identify(image, &organs).await {
        Ok(results) => results,
        Err(Error::NotFound { .. }) => {
            return Ok((
                headers,
                Json(serde_json::json!({
                    "results": [],
                    "bestMatch": null,
                    "query": { "organs": organs },
                    "message": NO_MATCH_HINT,
                })),
            ));
        }
        Err(e) => return Err(ApiError::upstream(e, IDENTIFY_MESSAGES)),
    };

    tracing::info!(user_id = %user.user_id, matches = results.len(), "identification answered");

    Ok((
        headers,
        Json(serde_json::json!({
            "bestMatch": results.first(),
            "results": results,
            "query": { "organs": organs },
        })),
    ))
}
