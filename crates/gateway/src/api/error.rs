//! HTTP error mapping.
//!
//! Every failure a handler can produce is an [`ApiError`]; its
//! [`IntoResponse`] impl renders the JSON body and status the mobile client
//! expects (`{ "error": "..." }` plus extra fields for denials).

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};

use fg_domain::error::Error;
use fg_metering::{AdmissionResult, Denial};

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Per-route wording for upstream failures.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamMessages {
    pub rate_limited: &'static str,
    pub empty: &'static str,
    pub unavailable: &'static str,
}

pub const CHAT_MESSAGES: UpstreamMessages = UpstreamMessages {
    rate_limited: "AI service rate limited. Try again in a moment.",
    empty: "No response from AI",
    unavailable: "AI service unavailable",
};

pub const RECOMMEND_MESSAGES: UpstreamMessages = UpstreamMessages {
    rate_limited: "AI service rate limited. Try again later.",
    empty: "No recommendation from AI",
    unavailable: "Recommendation service unavailable",
};

pub const DIAGNOSE_MESSAGES: UpstreamMessages = UpstreamMessages {
    rate_limited: "AI service rate limited. Try again in a moment.",
    empty: "No diagnosis from AI",
    unavailable: "Diagnosis service unavailable",
};

pub const IDENTIFY_MESSAGES: UpstreamMessages = UpstreamMessages {
    rate_limited: "Plant identification service rate limited. Try again later.",
    empty: "Plant identification service unavailable",
    unavailable: "Plant identification service unavailable",
};

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    ProRequired,
    Forbidden,
    NotFound,
    BadRequest(String),
    Denied(AdmissionResult),
    Upstream {
        error: Error,
        messages: UpstreamMessages,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn upstream(error: Error, messages: UpstreamMessages) -> Self {
        Self::Upstream { error, messages }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// `X-RateLimit-*` headers for an admitted (or quota-denied) request.
pub fn rate_limit_headers(admission: &AdmissionResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(admission.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(admission.remaining));
    headers
}

fn denial_response(admission: &AdmissionResult) -> Response {
    match admission.reason {
        Some(Denial::BudgetExceeded) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": "AI features temporarily unavailable due to high demand",
                "message": "Please try again later. Our AI features will be back soon.",
            })),
        )
            .into_response(),
        Some(Denial::QuotaExceeded) | None => (
            StatusCode::TOO_MANY_REQUESTS,
            rate_limit_headers(admission),
            Json(serde_json::json!({
                "error": "Daily limit reached",
                "category": admission.category,
                "limit": admission.limit,
                "remaining": 0,
                "resetsAt": admission.reset_at,
            })),
        )
            .into_response(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized(message) => json_error(StatusCode::UNAUTHORIZED, &message),
            Self::ProRequired => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({
                    "error": "Pro subscription required",
                    "upgrade": true,
                })),
            )
                .into_response(),
            Self::Forbidden => json_error(StatusCode::FORBIDDEN, "Forbidden"),
            Self::NotFound => json_error(StatusCode::NOT_FOUND, "Not found"),
            Self::BadRequest(message) => json_error(StatusCode::BAD_REQUEST, &message),
            Self::Denied(admission) => denial_response(&admission),
            Self::Upstream { error, messages } => {
                tracing::error!(error = %error, "upstream call failed");
                match error {
                    Error::RateLimited { .. } => {
                        json_error(StatusCode::TOO_MANY_REQUESTS, messages.rate_limited)
                    }
                    Error::EmptyResponse { .. } => {
                        json_error(StatusCode::BAD_GATEWAY, messages.empty)
                    }
                    _ => json_error(StatusCode::INTERNAL_SERVER_ERROR, messages.unavailable),
                }
            }
        }
    }
}
