//! Refresh token cookie handling.

use axum::http::header;
use std::time::Duration;

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refreshtoken";

/// The refresh cookie is only sent to routes under this path.
pub const REFRESH_COOKIE_PATH: &str = "/refresh_token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Builds `Set-Cookie` values for the refresh token.
#[derive(Debug, Clone, Copy)]
pub struct RefreshCookie {
    secure: bool,
}

impl RefreshCookie {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// Cookie carrying a newly issued refresh token.
    pub fn set(&self, token: &str, max_age: Duration) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Strict; Path={}; Max-Age={}{}",
            REFRESH_COOKIE_NAME,
            token,
            REFRESH_COOKIE_PATH,
            max_age.as_secs(),
            self.secure_attr()
        )
    }

    /// Cookie that removes the refresh token, with the same attributes it was set with.
    pub fn clear(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Strict; Path={}; Max-Age=0{}",
            REFRESH_COOKIE_NAME,
            REFRESH_COOKIE_PATH,
            self.secure_attr()
        )
    }

    fn secure_attr(&self) -> &'static str {
        if self.secure { "; Secure" } else { "" }
    }
}
