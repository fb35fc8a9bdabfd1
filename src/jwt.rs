//! JWT token generation and validation.
//!
//! One [`TokenCodec`] exists per token class. Each codec owns its own secret and
//! lifetime, so a token signed by the access codec never validates under the refresh
//! codec and vice versa.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default access token lifetime: 15 minutes
pub const ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime: 7 days
pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Source of the current time in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Used to test expiry without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Start at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now())
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_secs(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Which kind of credential a codec produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Access,
    Refresh,
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenClass::Access => f.write_str("access"),
            TokenClass::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims carried by both token classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account identifier)
    pub sub: String,
    /// JWT ID, random per token so two tokens are never byte-identical
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    /// Seconds between issuance and expiry.
    pub fn lifetime_secs(&self) -> u64 {
        self.claims.exp.saturating_sub(self.claims.iat)
    }
}

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token lifetime out of range")]
    LifetimeOutOfRange,
}

/// Signs and verifies tokens of a single class.
#[derive(Clone)]
pub struct TokenCodec {
    class: TokenClass,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("class", &self.class)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(class: TokenClass, secret: &[u8], lifetime: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            class,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime,
            clock,
        }
    }

    /// The configured lifetime for this token class.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Sign a token for `subject` that expires `lifetime` from now.
    pub fn issue(&self, subject: &str, lifetime: Duration) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();
        let exp = now
            .checked_add(lifetime.as_secs())
            .ok_or(TokenError::LifetimeOutOfRange)?;
        let claims = Claims {
            sub: subject.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify the signature and expiry of a token.
    ///
    /// A token is valid while `now < exp`.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify_signature(token)?;
        if self.clock.now() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Verify only the signature, accepting tokens past their expiry.
    /// Only logout uses this, to find the account a stale cookie belonged to.
    pub fn decode_allow_expired(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_signature(token)
    }

    fn verify_signature(&self, token: &str) -> Result<Claims, TokenError> {
        // Expiry is checked against the injected clock, not the library's wall clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}
