#![allow(dead_code)]

use argon2::Params;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use jwtgate::{
    ServerConfig, create_app,
    db::Database,
    jwt::{ACCESS_TOKEN_LIFETIME, ManualClock, REFRESH_TOKEN_LIFETIME},
    password::PasswordHasher,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use tower::ServiceExt;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-0123456789abcdef";

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub clock: Arc<ManualClock>,
}

pub async fn setup() -> TestApp {
    TestSetup::new().build().await
}

/// Builder for test setup with various options
pub struct TestSetup {
    secure_cookies: bool,
    revoke_on_reuse: bool,
    login_attempts_per_minute: Option<NonZeroU32>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self {
            secure_cookies: false,
            revoke_on_reuse: false,
            login_attempts_per_minute: None,
        }
    }

    pub fn with_secure_cookies(mut self) -> Self {
        self.secure_cookies = true;
        self
    }

    pub fn with_revoke_on_reuse(mut self) -> Self {
        self.revoke_on_reuse = true;
        self
    }

    pub fn with_login_limit(mut self, per_minute: u32) -> Self {
        self.login_attempts_per_minute = NonZeroU32::new(per_minute);
        self
    }

    pub async fn build(self) -> TestApp {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let clock = Arc::new(ManualClock::starting_now());

        let config = ServerConfig {
            db: db.clone(),
            access_secret: ACCESS_SECRET.to_vec(),
            refresh_secret: REFRESH_SECRET.to_vec(),
            access_lifetime: ACCESS_TOKEN_LIFETIME,
            refresh_lifetime: REFRESH_TOKEN_LIFETIME,
            secure_cookies: self.secure_cookies,
            cors_origin: Some("http://localhost:3000".to_string()),
            revoke_on_reuse: self.revoke_on_reuse,
            login_attempts_per_minute: self.login_attempts_per_minute,
            // Minimal cost keeps hashing fast in tests
            passwords: PasswordHasher::with_params(Params::new(8, 1, 1, None).unwrap()),
            clock: clock.clone(),
        };

        TestApp {
            app: create_app(&config),
            db,
            clock,
        }
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn register(&self, email: &str, password: &str) -> Response<Body> {
        self.post_json(
            "/register",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        self.post_json(
            "/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Register and log in, returning (access token, refresh token).
    pub async fn signed_in_user(&self, email: &str, password: &str) -> (String, String) {
        let response = self.register(email, password).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = self.login(email, password).await;
        assert_eq!(response.status(), StatusCode::OK);

        let refresh = refresh_cookie_value(&extract_set_cookies(&response))
            .expect("Login should set the refresh cookie");
        let body = body_json(response).await;
        let access = body["accessToken"].as_str().unwrap().to_string();
        (access, refresh)
    }

    pub async fn refresh(&self, refresh_token: Option<&str>) -> Response<Body> {
        self.post_with_cookie("/refresh_token", refresh_token).await
    }

    pub async fn logout(&self, refresh_token: Option<&str>) -> Response<Body> {
        self.post_with_cookie("/logout", refresh_token).await
    }

    pub async fn post_with_cookie(&self, uri: &str, refresh_token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(token) = refresh_token {
            builder = builder.header("cookie", format!("refreshtoken={}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn protected(&self, authorization: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn stored_refresh_token(&self, email: &str) -> Option<String> {
        self.db
            .accounts()
            .find_by_email(email)
            .await
            .unwrap()
            .expect("Account should exist")
            .refresh_token
    }
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value of a non-empty refresh cookie, if one was set
pub fn refresh_cookie_value(cookies: &[String]) -> Option<String> {
    cookies.iter().find_map(|c| {
        let value = c.strip_prefix("refreshtoken=")?.split(';').next()?;
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Check if cookies contain the refresh token being cleared (Max-Age=0)
pub fn has_cleared_refresh_cookie(cookies: &[String]) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with("refreshtoken=;") && c.contains("Max-Age=0"))
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
