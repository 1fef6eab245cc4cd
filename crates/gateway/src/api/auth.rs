//! Bearer JWT authentication.
//!
//! Tokens are HS256 JWTs issued by the app backend with the payload
//! `{ userId, isPro, iat, exp }`.  The signing secret is read once at
//! startup (see [`crate::state::Secrets`]); when it is missing every
//! protected request is refused.
//!
//! Handlers opt in by taking [`AuthUser`] or [`ProUser`] as a parameter.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use fg_metering::Clock as _;

use crate::api::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Missing or invalid Authorization header")]
    Missing,
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Invalid token payload")]
    InvalidPayload,
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::Unauthorized(e.to_string())
    }
}

/// Claims carried by an issued token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: String,
    pub is_pro: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClaims {
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    is_pro: Option<Value>,
    #[serde(default)]
    exp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub is_pro: bool,
}

/// An authenticated caller with an active Pro subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProUser(pub AuthUser);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Verification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Verify an HS256 token and extract the caller.
pub fn verify_token(token: &str, secret: &[u8], now: DateTime<Utc>) -> Result<AuthUser, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Invalid);
    };

    let header: Header = decode_segment(header).ok_or(TokenError::Invalid)?;
    if header.alg != "HS256" {
        return Err(TokenError::Invalid);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Invalid)?;
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::Invalid)?;
    mac.update(token[..header_and_payload_len(token)].as_bytes());
    // `verify_slice` compares in constant time.
    mac.verify_slice(&signature).map_err(|_| TokenError::Invalid)?;

    let claims: RawClaims = decode_segment(payload).ok_or(TokenError::Invalid)?;

    if let Some(exp) = claims.exp {
        if now.timestamp() >= exp {
            return Err(TokenError::Expired);
        }
    }

    let user_id = match claims.user_id {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(TokenError::InvalidPayload),
    };

    Ok(AuthUser {
        user_id,
        is_pro: matches!(claims.is_pro, Some(Value::Bool(true))),
    })
}

/// Sign `claims` with `secret`.  Used by the `token` CLI command and tests.
pub fn issue_token(claims: &TokenClaims, secret: &[u8]) -> Result<String, TokenError> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::to_vec(claims).map_err(|_| TokenError::InvalidPayload)?;
    let signing_input = format!("{header}.{}", URL_SAFE_NO_PAD.encode(payload));

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::Invalid)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

fn header_and_payload_len(token: &str) -> usize {
    token.rfind('.').unwrap_or(token.len())
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Extractors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or(TokenError::Missing)?;

        let Some(secret) = state.jwt_secret.as_deref() else {
            tracing::warn!("rejecting request: JWT secret is not configured");
            return Err(TokenError::Invalid.into());
        };

        verify_token(token, secret, state.clock.now()).map_err(|e| {
            tracing::debug!(reason = %e, "token rejected");
            ApiError::from(e)
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ProUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_pro {
            return Err(ApiError::ProRequired);
        }
        Ok(ProUser(user))
    }
}
