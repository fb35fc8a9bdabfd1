pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use api::create_api_router;
use auth::{SessionManager, TokenIssuer};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use db::Database;
use jwt::{Clock, TokenClass, TokenCodec};
use password::PasswordHasher;
use rate_limit::LoginThrottle;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret for signing refresh tokens, distinct from the access secret
    pub refresh_secret: Vec<u8>,
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Origin allowed to make credentialed cross-origin requests
    pub cors_origin: Option<String>,
    /// Clear the live refresh token when a stale one is presented
    pub revoke_on_reuse: bool,
    /// Login attempts allowed per email per minute (None disables throttling)
    pub login_attempts_per_minute: Option<NonZeroU32>,
    pub passwords: PasswordHasher,
    pub clock: Arc<dyn Clock>,
}

/// Build the token issuer from the two independently configured codecs.
pub fn create_issuer(config: &ServerConfig) -> TokenIssuer {
    TokenIssuer::new(
        TokenCodec::new(
            TokenClass::Access,
            &config.access_secret,
            config.access_lifetime,
            config.clock.clone(),
        ),
        TokenCodec::new(
            TokenClass::Refresh,
            &config.refresh_secret,
            config.refresh_lifetime,
            config.clock.clone(),
        ),
    )
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let issuer = Arc::new(create_issuer(config));

    let sessions = SessionManager::new(
        config.db.clone(),
        issuer.clone(),
        config.passwords.clone(),
        config.revoke_on_reuse,
    );

    let throttle = match config.login_attempts_per_minute {
        Some(per_minute) => LoginThrottle::per_minute(per_minute),
        None => LoginThrottle::disabled(),
    };

    let router = create_api_router(
        config.db.clone(),
        issuer,
        sessions,
        config.secure_cookies,
        throttle,
    )
    .layer(TraceLayer::new_for_http());

    match config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        ),
        Some(Err(e)) => {
            warn!(error = %e, "Ignoring invalid CORS origin");
            router
        }
        None => router,
    }
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let result = axum::serve(listener, app.into_make_service()).await;
    config.db.close().await;
    result
}
