//! Shared error handling for API endpoints.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::AuthError;

/// API error type with automatic response conversion.
pub enum ApiError {
    BadRequest(String),
    TooManyRequests(String),
    Auth(AuthError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::TooManyRequests(msg.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

/// Unreadable request bodies (bad JSON, missing fields, wrong content type) are a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self::bad_request("Invalid request body")
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    success: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::Auth(e) => return e.into_response(),
        };
        (
            status,
            Json(ErrorResponse {
                message,
                success: false,
            }),
        )
            .into_response()
    }
}

/// Validate the shape of submitted credentials.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }
    if email.len() > 254 {
        return Err(ApiError::bad_request("Email is too long"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(ApiError::bad_request("Invalid email address")),
    }
    if password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("a@b.com", "secret").is_ok());
        assert!(validate_credentials("", "secret").is_err());
        assert!(validate_credentials("no-at-sign", "secret").is_err());
        assert!(validate_credentials("@b.com", "secret").is_err());
        assert!(validate_credentials("a@", "secret").is_err());
        assert!(validate_credentials("a@b.com", "").is_err());
    }
}
