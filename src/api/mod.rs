mod auth;
mod error;
mod protected;

use axum::Router;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{RefreshCookie, SessionManager, TokenIssuer};
use crate::db::{Account, Database};
use crate::rate_limit::LoginThrottle;

pub use auth::AuthState;
pub use error::ApiError;
pub use protected::ProtectedState;

/// Public view of an account. Does not expose internal database IDs or secrets.
#[derive(Debug, Clone, Serialize)]
pub struct AccountData {
    pub id: String,
    pub email: String,
}

impl From<&Account> for AccountData {
    fn from(account: &Account) -> Self {
        Self {
            id: account.uuid.clone(),
            email: account.email.clone(),
        }
    }
}

/// Create the API router.
pub fn create_api_router(
    db: Database,
    issuer: Arc<TokenIssuer>,
    sessions: SessionManager,
    secure_cookies: bool,
    throttle: LoginThrottle,
) -> Router {
    let auth_state = AuthState {
        sessions,
        cookie: RefreshCookie::new(secure_cookies),
        throttle,
    };

    let protected_state = ProtectedState { db, issuer };

    Router::new()
        .merge(auth::router(auth_state))
        .merge(protected::router(protected_state))
}
