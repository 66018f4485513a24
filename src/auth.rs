//! API authentication: optional shared bearer token plus caller identity.
//!
//! Session management is an upstream concern; the daemon trusts the
//! `x-user-id` header once the bearer token (when configured) checks out.

use axum::http::HeaderMap;

/// Constant-time token comparison so response timing never reveals where
/// tokens first differ.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    // Empty tokens are never valid
    if provided.is_empty() || expected.is_empty() {
        return false;
    }

    let len_match = provided.len() == expected.len();

    let mut diff: u8 = 0;
    for (a, b) in provided.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }

    len_match && diff == 0
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();

    if header.len() < 7 {
        return None;
    }

    let (prefix, token) = header.split_at(7);
    if prefix.eq_ignore_ascii_case("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    } else {
        None
    }
}

#[derive(Clone, Default)]
pub struct ApiAuth {
    token: Option<String>,
}

impl ApiAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// True when the request may proceed: either auth is disabled or the
    /// Authorization header carries the configured token.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.token else {
            return true;
        };

        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(|token| tokens_match(token, expected))
            .unwrap_or(false)
    }
}

/// Caller identity from the `x-user-id` header.
pub fn user_id(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
