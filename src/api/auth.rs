//! Session endpoints.
//!
//! - POST `/register` - Create an account
//! - POST `/login` - Check credentials, issue an access token and set the refresh cookie
//! - POST `/refresh_token` - Rotate the refresh cookie and issue a new access token
//! - POST `/logout`, POST `/refresh_token/logout` - Invalidate the refresh token and clear
//!   the cookie

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::AccountData;
use super::error::{ApiError, validate_credentials};
use crate::auth::{REFRESH_COOKIE_NAME, RefreshCookie, SessionManager, get_cookie};
use crate::rate_limit::LoginThrottle;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: SessionManager,
    pub cookie: RefreshCookie,
    pub throttle: LoginThrottle,
}

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh_token", post(refresh_token))
        .route("/refresh_token/logout", post(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct CredentialsRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: &'static str,
    data: AccountData,
    success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    email: String,
    success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    success: bool,
}

#[derive(Serialize)]
struct LogoutResponse {
    message: &'static str,
    success: bool,
}

async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let email = payload.email.trim();
    validate_credentials(email, &payload.password)?;

    let account = state.sessions.register(email, &payload.password).await?;

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            message: "User created successfully",
            data: AccountData::from(&account),
            success: true,
        }),
    ))
}

async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let email = payload.email.trim();
    validate_credentials(email, &payload.password)?;

    if !state.throttle.check(email) {
        tracing::warn!(email = %email, "Login throttled");
        return Err(ApiError::too_many_requests(
            "Too many login attempts. Please wait before trying again.",
        ));
    }

    let outcome = state.sessions.login(email, &payload.password).await?;
    let cookie = state.cookie.set(
        &outcome.tokens.refresh.token,
        state.sessions.issuer().refresh().lifetime(),
    );

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            access_token: outcome.tokens.access.token,
            email: outcome.account.email,
            success: true,
        }),
    ))
}

/// Exchange the refresh cookie for a new access token and a rotated cookie.
async fn refresh_token(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let presented = get_cookie(&headers, REFRESH_COOKIE_NAME).filter(|t| !t.is_empty());

    let tokens = state.sessions.refresh(presented).await?;
    let cookie = state.cookie.set(
        &tokens.refresh.token,
        state.sessions.issuer().refresh().lifetime(),
    );

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(RefreshResponse {
            access_token: tokens.access.token,
            success: true,
        }),
    ))
}

/// Logout always succeeds and always clears the cookie.
async fn logout(State(state): State<AuthState>, headers: HeaderMap) -> impl IntoResponse {
    let presented = get_cookie(&headers, REFRESH_COOKIE_NAME).filter(|t| !t.is_empty());
    state.sessions.logout(presented).await;

    (
        StatusCode::OK,
        [(SET_COOKIE, state.cookie.clear())],
        Json(LogoutResponse {
            message: "Logged out",
            success: true,
        }),
    )
}
