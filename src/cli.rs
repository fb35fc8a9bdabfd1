//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::SystemClock;
use crate::password::PasswordHasher;
use clap::Parser;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

const MIN_SECRET_LENGTH: usize = 32;

/// Upper bound for configured token lifetimes: 10 years.
const MAX_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

pub const ACCESS_SECRET_VAR: &str = "ACCESS_TOKEN_SECRET";
pub const REFRESH_SECRET_VAR: &str = "REFRESH_TOKEN_SECRET";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "jwtgate",
    about = "Access/refresh token sessions for a protected API"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "4000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "jwtgate.db")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer ACCESS_TOKEN_SECRET instead
    #[arg(long)]
    pub access_token_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer REFRESH_TOKEN_SECRET instead
    #[arg(long)]
    pub refresh_token_secret_file: Option<String>,

    /// Access token lifetime, e.g. "900", "15m", "1h"
    #[arg(long, env = "ACCESS_TOKEN_TTL", default_value = "15m", value_parser = parse_lifetime)]
    pub access_token_ttl: Duration,

    /// Refresh token lifetime, e.g. "7d"
    #[arg(long, env = "REFRESH_TOKEN_TTL", default_value = "7d", value_parser = parse_lifetime)]
    pub refresh_token_ttl: Duration,

    /// Set the Secure flag on the refresh cookie (use behind HTTPS)
    #[arg(long, env = "SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Origin of the web client allowed to send credentialed requests
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000", value_parser = validate_origin)]
    pub cors_origin: String,

    /// End the session when a rotated-away refresh token is presented again
    #[arg(long, env = "REVOKE_ON_REUSE")]
    pub revoke_on_reuse: bool,

    /// Login attempts allowed per email per minute (0 disables the limit)
    #[arg(long, default_value = "10")]
    pub login_attempts_per_minute: u32,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Parse a lifetime such as "30s", "15m", "12h", "7d" or a bare number of seconds.
pub fn parse_lifetime(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], c),
        Some(_) => (s, 's'),
        None => return Err("Lifetime cannot be empty".to_string()),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("Invalid lifetime: {}", s))?;

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return Err(format!("Unknown lifetime unit '{}': use s, m, h or d", unit)),
    };

    if value == 0 {
        return Err("Lifetime must be greater than zero".to_string());
    }

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .filter(|lifetime| *lifetime <= MAX_LIFETIME)
        .ok_or_else(|| format!("Lifetime is too large: {} (at most 3650d)", s))
}

fn validate_origin(s: &str) -> Result<String, String> {
    let url = Url::parse(s).map_err(|e| format!("Invalid origin {}: {}", s, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("Origin must use http or https: {}", s));
    }

    // Browsers send the origin without a trailing slash
    Ok(url.origin().ascii_serialization())
}

/// Initialize logging based on the specified format. `RUST_LOG` overrides the default level.
pub fn init_logging(format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Load a signing secret from an environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_secret(var: &str, secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            variable = %var,
            "Secret is required. Set the environment variable (recommended) or pass a secret file"
        );
        return None;
    };

    if secret.len() < MIN_SECRET_LENGTH {
        error!(
            variable = %var,
            "Secret is shorter than {} characters. Use a longer secret", MIN_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load both signing secrets and make sure they are not interchangeable.
pub fn load_secrets(args: &Args) -> Option<(String, String)> {
    let access = load_secret(ACCESS_SECRET_VAR, args.access_token_secret_file.as_deref())?;
    let refresh = load_secret(REFRESH_SECRET_VAR, args.refresh_token_secret_file.as_deref())?;

    if access == refresh {
        error!("Access and refresh token secrets must differ");
        return None;
    }

    Some((access, refresh))
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    args: &Args,
    db: Database,
    access_secret: String,
    refresh_secret: String,
) -> ServerConfig {
    ServerConfig {
        db,
        access_secret: access_secret.into_bytes(),
        refresh_secret: refresh_secret.into_bytes(),
        access_lifetime: args.access_token_ttl,
        refresh_lifetime: args.refresh_token_ttl,
        secure_cookies: args.secure_cookies,
        cors_origin: Some(args.cors_origin.clone()),
        revoke_on_reuse: args.revoke_on_reuse,
        login_attempts_per_minute: NonZeroU32::new(args.login_attempts_per_minute),
        passwords: PasswordHasher::new(),
        clock: Arc::new(SystemClock),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
