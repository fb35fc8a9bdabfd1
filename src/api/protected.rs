//! Endpoints that require a valid access token.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

use super::AccountData;
use super::error::ApiError;
use crate::auth::{AuthError, Authenticated, TokenIssuer, UNAUTHORIZED};
use crate::db::Database;
use crate::impl_has_access_codec;

#[derive(Clone)]
pub struct ProtectedState {
    pub db: Database,
    pub issuer: Arc<TokenIssuer>,
}

impl_has_access_codec!(ProtectedState);

pub fn router(state: ProtectedState) -> Router {
    Router::new()
        .route("/protected", get(protected).post(protected))
        .with_state(state)
}

#[derive(Serialize)]
struct ProtectedResponse {
    data: AccountData,
    success: bool,
}

/// Return the account behind the access token.
async fn protected(
    State(state): State<ProtectedState>,
    Authenticated(identity): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .db
        .accounts()
        .find_by_uuid(identity.as_str())
        .await
        .map_err(|e| AuthError::unavailable("Failed to get account", e))?
        .ok_or(AuthError::Unauthorized(UNAUTHORIZED))?;

    Ok((
        StatusCode::OK,
        Json(ProtectedResponse {
            data: AccountData::from(&account),
            success: true,
        }),
    ))
}
