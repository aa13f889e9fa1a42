//! Session token extraction from an HTTP request.

use axum::http::{HeaderMap, header};

pub const TOKEN_HEADER: &str = "x-session-token";
pub const TOKEN_COOKIE: &str = "session_token";

/// Look for the token in `Authorization: Bearer`, `x-session-token`, the
/// `session_token` cookie, and finally the `token` query parameter.
pub fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    let custom = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    let cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim());

    bearer
        .or(custom)
        .or(cookie)
        .or(query_token)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
