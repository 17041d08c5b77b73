pub mod password;
pub mod token;
mod user;

pub use user::CurrentUser;

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};

pub const TOKEN_COOKIE: &str = "token";

/// Session token from `Authorization: Bearer`, falling back to the `token`
/// cookie.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty() && *value != "none")
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, max_age_days: i64) -> String {
    format!(
        "{TOKEN_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        max_age_days * 24 * 60 * 60
    )
}

/// `Set-Cookie` value that replaces the session with a short-lived blank.
pub fn cleared_cookie() -> String {
    format!("{TOKEN_COOKIE}=none; Max-Age=10; Path=/; HttpOnly; SameSite=Lax")
}
