//! Google Gemini `generateContent` client.
//!
//! Auth is an API key passed as the `key` query parameter.  Only the first
//! candidate's first text part is used.

use std::time::Duration;

use serde_json::Value;

use fg_domain::config::GeminiConfig;
use fg_domain::error::{Error, Result};

use super::{from_reqwest, status_error};

const PROVIDER: &str = "gemini";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Model,
}

#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    InlineImage { mime_type: String, base64: String },
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub speaker: Speaker,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Model,
            parts: vec![Part::Text(text.into())],
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system: Option<String>,
    pub turns: Vec<Turn>,
    pub temperature: f32,
    /// Per-call override of the configured timeout.
    pub timeout: Option<Duration>,
}

/// Token counts reported in `usageMetadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_output_tokens: u32,
    timeout: Duration,
    vision_timeout: Duration,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(from_reqwest)?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
            max_output_tokens: cfg.max_output_tokens,
            timeout: Duration::from_millis(cfg.timeout_ms),
            vision_timeout: Duration::from_millis(cfg.vision_timeout_ms),
            client,
        })
    }

    pub fn vision_timeout(&self) -> Duration {
        self.vision_timeout
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn generate(&self, req: &GenerateRequest) -> Result<Generation> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Gemini API key is not configured".into()))?;

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = build_body(req, self.max_output_tokens);

        tracing::debug!(model = %self.model, turns = req.turns.len(), "gemini request");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .timeout(req.timeout.unwrap_or(self.timeout))
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(status_error(PROVIDER, status, &text));
        }

        let json: Value = serde_json::from_str(&text)?;
        parse_response(&json)
    }
}

fn build_body(req: &GenerateRequest, max_output_tokens: u32) -> Value {
    let contents: Vec<Value> = req.turns.iter().map(turn_to_json).collect();

    let mut body = serde_json::json!({
        "contents": contents,
        "generationConfig": {
            "maxOutputTokens": max_output_tokens,
            "temperature": req.temperature,
        },
    });
    if let Some(system) = &req.system {
        body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
    }
    body
}

fn turn_to_json(turn: &Turn) -> Value {
    let role = match turn.speaker {
        Speaker::User => "user",
        Speaker::Model => "model",
    };
    let parts: Vec<Value> = turn
        .parts
        .iter()
        .map(|p| match p {
            Part::Text(text) => serde_json::json!({ "text": text }),
            Part::InlineImage { mime_type, base64 } => serde_json::json!({
                "inlineData": { "mimeType": mime_type, "data": base64 }
            }),
        })
        .collect();
    serde_json::json!({ "role": role, "parts": parts })
}

fn parse_response(body: &Value) -> Result<Generation> {
    let text = body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::EmptyResponse {
            provider: PROVIDER.into(),
        })?;

    let usage = body.get("usageMetadata").map(|u| TokenUsage {
        input: u.get("promptTokenCount").and_then(Value::as_u64).unwrap_or(0),
        output: u.get("candidatesTokenCount").and_then(Value::as_u64).unwrap_or(0),
    });

    Ok(Generation {
        text: text.to_string(),
        usage,
    })
}
