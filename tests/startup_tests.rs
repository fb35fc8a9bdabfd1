//! Tests for serving the app over a real socket.

mod common;

use argon2::Params;
use jwtgate::{
    ServerConfig,
    db::Database,
    jwt::{ACCESS_TOKEN_LIFETIME, ManualClock, REFRESH_TOKEN_LIFETIME},
    password::PasswordHasher,
    run_server,
};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start_server() -> std::net::SocketAddr {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db,
        access_secret: common::ACCESS_SECRET.to_vec(),
        refresh_secret: common::REFRESH_SECRET.to_vec(),
        access_lifetime: ACCESS_TOKEN_LIFETIME,
        refresh_lifetime: REFRESH_TOKEN_LIFETIME,
        secure_cookies: false,
        cors_origin: None,
        revoke_on_reuse: false,
        login_attempts_per_minute: None,
        passwords: PasswordHasher::with_params(Params::new(8, 1, 1, None).unwrap()),
        clock: Arc::new(ManualClock::starting_now()),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(run_server(config, listener));
    addr
}

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_server_answers_over_tcp() {
    let addr = start_server().await;

    let response = raw_request(
        addr,
        "POST /refresh_token HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(
        response.starts_with("HTTP/1.1 401"),
        "unexpected response: {}",
        response
    );
    assert!(response.contains("No refresh token"));
}

#[tokio::test]
async fn test_server_logout_over_tcp() {
    let addr = start_server().await;

    let response = raw_request(
        addr,
        "POST /logout HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200"), "unexpected response: {}", response);
    assert!(response.to_ascii_lowercase().contains("set-cookie: refreshtoken=;"));
}
