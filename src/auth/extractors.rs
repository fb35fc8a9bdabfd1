//! Axum extractor for bearer token authentication.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::errors::{AuthError, UNAUTHORIZED};
use super::state::HasAccessCodec;
use super::types::Identity;
use crate::jwt::TokenCodec;

/// Scheme prefix of the Authorization header, matched case-sensitively.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Return the token part of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

/// Verify the access token of a request without touching the account store.
///
/// All failures collapse into the same `Unauthorized` error so clients cannot tell
/// a bad signature from an expired or malformed token.
pub fn verify_bearer(headers: &HeaderMap, codec: &TokenCodec) -> Result<Identity, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::Unauthorized(UNAUTHORIZED))?;

    let claims = codec.decode(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AuthError::Unauthorized(UNAUTHORIZED)
    })?;

    Ok(Identity::new(claims.sub))
}

/// Extractor for endpoints that require a valid access token.
/// The resolved identity is handed to the handler as a value.
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: HasAccessCodec + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        verify_bearer(&parts.headers, state.access_codec()).map(Authenticated)
    }
}
