//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

pub const UNAUTHORIZED: &str = "Unauthorized";
pub const NO_REFRESH_TOKEN: &str = "No refresh token";
pub const INVALID_REFRESH_TOKEN: &str = "invalid refresh token";
pub const REFRESH_TOKEN_EXPIRED: &str = "refresh token expired";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const USER_EXISTS: &str = "User already exists";

/// Every authentication failure maps to exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing, malformed or rejected credential.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// Expired refresh token. Access token expiry is reported as `Unauthorized`.
    #[error("refresh token expired")]
    Expired,
    /// The account store (or another collaborator) failed.
    #[error("{0}")]
    Unavailable(String),
    /// The account already exists.
    #[error("{0}")]
    Conflict(String),
}

impl AuthError {
    /// Log a collaborator failure and hide its details from the client.
    pub fn unavailable(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Unavailable(context.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

#[derive(Serialize)]
struct UnauthorizedBody {
    message: String,
}

#[derive(Serialize)]
struct FailureBody {
    message: String,
    success: bool,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status == StatusCode::UNAUTHORIZED {
            (status, Json(UnauthorizedBody { message })).into_response()
        } else {
            (
                status,
                Json(FailureBody {
                    message,
                    success: false,
                }),
            )
                .into_response()
        }
    }
}
