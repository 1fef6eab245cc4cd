//! `POST /api/v1/diagnose`: photo-based plant problem diagnosis.
//!
//! Multipart fields: `image` (required), `plantName`, `description`, and
//! `context` (a JSON string with zone, season and weather).  Counts against
//! the `photo` quota and is billed to the `diagnose` bucket.

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Json};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use fg_domain::Category;

use crate::api::auth::ProUser;
use crate::api::error::{rate_limit_headers, ApiError, DIAGNOSE_MESSAGES};
use crate::api::upload::read_photo_form;
use crate::api::{admit, record_spend};
use crate::prompts::{diagnosis_question, diagnosis_system_prompt, GardenContext};
use crate::state::AppState;
use crate::upstream::gemini::{GenerateRequest, Part, Speaker, Turn};

pub const SPEND_BUCKET: &str = "diagnose";

pub async fn diagnose(
    ProUser(user): ProUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = read_photo_form(multipart, state.config.server.max_upload_bytes).await?;
    let image = form.require_image()?;

    let plant_name = form.field("plantName").unwrap_or("unknown plant").to_owned();
    let description = form.field("description").unwrap_or("").to_owned();
    // A malformed context is ignored rather than rejected.
    let context: GardenContext = form
        .field("context")
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();

    let admission = admit(&state, &user.user_id, Category::Photo)?;

    let request = GenerateRequest {
        system: Some(diagnosis_system_prompt(&context)),
        turns: vec![Turn {
            speaker: Speaker::User,
            parts: vec![
                Part::InlineImage {
                    mime_type: image.mime_type,
                    base64: STANDARD.encode(&image.bytes),
                },
                Part::Text(diagnosis_question(&plant_name, &description)),
            ],
        }],
        temperature: 0.4,
        timeout: Some(state.gemini.vision_timeout()),
    };
    let generation = state
        .gemini
        .generate(&request)
        .await
        .map_err(|e| ApiError::upstream(e, DIAGNOSE_MESSAGES))?;

    record_spend(&state, generation.usage, SPEND_BUCKET);
    tracing::info!(user_id = %user.user_id, plant = %plant_name, "diagnosis answered");

    Ok((
        rate_limit_headers(&admission),
        Json(serde_json::json!({
            "diagnosis": generation.text,
            "plantName": plant_name,
            "tokensUsed": generation.usage,
        })),
    ))
}
