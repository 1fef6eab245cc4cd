//! `POST /api/v1/chat`: garden advisor chat.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use fg_domain::Category;

use crate::api::auth::ProUser;
use crate::api::error::{rate_limit_headers, ApiError, CHAT_MESSAGES};
use crate::api::{admit, record_spend};
use crate::prompts::{chat_system_prompt, GardenContext};
use crate::state::AppState;
use crate::upstream::gemini::{GenerateRequest, Turn};

pub const MAX_MESSAGE_CHARS: usize = 2000;
/// Five exchanges.
pub const MAX_HISTORY_MESSAGES: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub context: Option<GardenContext>,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatRequest {
    fn validated_message(&self) -> Result<&str, ApiError> {
        let message = self
            .message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Message is required"))?;
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ApiError::bad_request(format!(
                "Message too long (max {MAX_MESSAGE_CHARS} characters)"
            )));
        }
        Ok(message)
    }

    fn turns(&self, message: &str) -> Vec<Turn> {
        let skip = self.history.len().saturating_sub(MAX_HISTORY_MESSAGES);
        let mut turns: Vec<Turn> = self.history[skip..]
            .iter()
            .map(|m| match m.role.as_str() {
                "user" => Turn::user_text(m.content.clone()),
                _ => Turn::model_text(m.content.clone()),
            })
            .collect();
        turns.push(Turn::user_text(message));
        turns
    }
}

pub async fn chat(
    ProUser(user): ProUser,
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let message = req.validated_message()?;

    let admission = admit(&state, &user.user_id, Category::Chat)?;

    let request = GenerateRequest {
        system: Some(chat_system_prompt(req.context.as_ref())),
        turns: req.turns(message),
        temperature: 0.7,
        timeout: None,
    };
    let generation = state
        .gemini
        .generate(&request)
        .await
        .map_err(|e| ApiError::upstream(e, CHAT_MESSAGES))?;

    record_spend(&state, generation.usage, Category::Chat.as_str());
    tracing::info!(user_id = %user.user_id, remaining = admission.remaining, "chat answered");

    Ok((
        rate_limit_headers(&admission),
        Json(serde_json::json!({
            "response": generation.text,
            "tokensUsed": generation.usage,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::gemini::Speaker;

    fn request(message: &str, history: usize) -> ChatRequest {
        ChatRequest {
            message: Some(message.into()),
            context: None,
            history: (0..history)
                .map(|i| HistoryMessage {
                    role: if i % 2 == 0 { "user".into() } else { "assistant".into() },
                    content: format!("m{i}"),
                })
                .collect(),
        }
    }

    #[test]
    fn blank_and_oversized_messages_are_rejected() {
        assert!(request("   ", 0).validated_message().is_err());
        assert!(request(&"a".repeat(MAX_MESSAGE_CHARS + 1), 0)
            .validated_message()
            .is_err());
        assert!(request(&"a".repeat(MAX_MESSAGE_CHARS), 0)
            .validated_message()
            .is_ok());
        let missing = ChatRequest {
            message: None,
            context: None,
            history: Vec::new(),
        };
        assert!(missing.validated_message().is_err());
    }

    #[test]
    fn history_is_trimmed_to_last_ten() {
        let req = request("now", 14);
        let turns = req.turns("now");
        assert_eq!(turns.len(), MAX_HISTORY_MESSAGES + 1);
        assert_eq!(turns[0].speaker, Speaker::User); // m4
        assert_eq!(turns[1].speaker, Speaker::Model); // m5, "assistant"
        assert_eq!(turns.last().map(|t| t.speaker), Some(Speaker::User));
    }
}
