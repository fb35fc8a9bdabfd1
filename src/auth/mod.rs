//! Token-based session lifecycle.
//!
//! Dual-token system: short-lived access tokens (stateless, verified from the
//! `Authorization` header) and long-lived refresh tokens (HTTP-only cookie). Exactly one
//! refresh token is live per account; it is mirrored into the account record and rotated
//! on every refresh.

mod cookie;
mod errors;
mod extractors;
mod issuer;
mod session;
mod state;
mod types;

pub use cookie::{REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH, RefreshCookie, get_cookie};
pub use errors::{
    AuthError, INVALID_CREDENTIALS, INVALID_REFRESH_TOKEN, NO_REFRESH_TOKEN,
    REFRESH_TOKEN_EXPIRED, UNAUTHORIZED, USER_EXISTS,
};
pub use extractors::{Authenticated, BEARER_PREFIX, bearer_token, verify_bearer};
pub use issuer::{TokenIssuer, TokenPair};
pub use session::{LoginOutcome, SessionManager};
pub use state::HasAccessCodec;
pub use types::Identity;
