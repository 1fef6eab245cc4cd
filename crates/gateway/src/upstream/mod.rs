//! Outbound clients for the inference and identification providers.
//!
//! Both clients translate transport and HTTP failures into the shared
//! [`fg_domain::error::Error`] so route handlers can map them to a status
//! code in one place.

pub mod gemini;
pub mod plantnet;

use fg_domain::error::Error;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Map a non-success HTTP status to the domain error for `provider`.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        429 => Error::RateLimited {
            provider: provider.to_owned(),
        },
        404 => Error::NotFound {
            provider: provider.to_owned(),
        },
        code => Error::Provider {
            provider: provider.to_owned(),
            message: format!("HTTP {code} - {}", truncate(body, 500)),
        },
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
