//! Login, refresh token rotation and logout.
//!
//! A refresh token is honored only if it decodes under the refresh codec AND is
//! byte-identical to the value stored on the account. Rotation swaps the stored value
//! with a conditional update, so of two requests racing with the same token at most one
//! wins.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::{
    AuthError, INVALID_CREDENTIALS, INVALID_REFRESH_TOKEN, NO_REFRESH_TOKEN, USER_EXISTS,
};
use super::issuer::{TokenIssuer, TokenPair};
use super::types::Identity;
use crate::db::{Account, Database};
use crate::jwt::TokenError;
use crate::password::PasswordHasher;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: Account,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    issuer: Arc<TokenIssuer>,
    passwords: PasswordHasher,
    revoke_on_reuse: bool,
}

impl SessionManager {
    /// With `revoke_on_reuse`, a refresh token that decodes but no longer matches the
    /// store also clears the account's live token, ending the session everywhere.
    pub fn new(
        db: Database,
        issuer: Arc<TokenIssuer>,
        passwords: PasswordHasher,
        revoke_on_reuse: bool,
    ) -> Self {
        Self {
            db,
            issuer,
            passwords,
            revoke_on_reuse,
        }
    }

    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Create an account with a hashed password.
    pub async fn register(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let accounts = self.db.accounts();

        if accounts
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::unavailable("Failed to look up account", e))?
            .is_some()
        {
            return Err(AuthError::Conflict(USER_EXISTS.into()));
        }

        let password_hash = self
            .passwords
            .hash(password)
            .await
            .map_err(|e| AuthError::unavailable("Failed to hash password", e))?;

        let uuid = uuid::Uuid::new_v4().to_string();
        let id = accounts
            .create(&uuid, email, &password_hash)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AuthError::Conflict(USER_EXISTS.into())
                }
                e => AuthError::unavailable("Failed to create account", e),
            })?;

        info!(account = %uuid, "Account created");

        Ok(Account {
            id,
            uuid,
            email: email.to_string(),
            password_hash,
            refresh_token: None,
        })
    }

    /// Check credentials, issue a token pair and make its refresh token the live one.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let accounts = self.db.accounts();

        let account = accounts
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::unavailable("Failed to look up account", e))?
            .ok_or(AuthError::Unauthorized(INVALID_CREDENTIALS))?;

        let valid = self
            .passwords
            .verify(password, &account.password_hash)
            .await
            .map_err(|e| AuthError::unavailable("Failed to verify credentials", e))?;
        if !valid {
            debug!(account = %account.uuid, "Wrong password");
            return Err(AuthError::Unauthorized(INVALID_CREDENTIALS));
        }

        let identity = Identity::new(&account.uuid);
        let tokens = self
            .issuer
            .issue_pair(&identity)
            .map_err(|e| AuthError::unavailable("Failed to issue tokens", e))?;

        accounts
            .set_refresh_token(identity.as_str(), Some(&tokens.refresh.token))
            .await
            .map_err(|e| AuthError::unavailable("Failed to store refresh token", e))?;

        info!(account = %identity, "Logged in");

        let account = Account {
            refresh_token: Some(tokens.refresh.token.clone()),
            ..account
        };
        Ok(LoginOutcome { account, tokens })
    }

    /// Exchange a refresh token for a new pair, invalidating the presented token.
    ///
    /// Any failure leaves the stored token untouched (unless reuse revocation is on).
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair, AuthError> {
        let token = presented.ok_or(AuthError::Unauthorized(NO_REFRESH_TOKEN))?;

        let claims = self.issuer.refresh().decode(token).map_err(|e| match e {
            TokenError::Expired => AuthError::Expired,
            e => {
                debug!(error = %e, "Rejected refresh token");
                AuthError::Unauthorized(INVALID_REFRESH_TOKEN)
            }
        })?;
        let identity = Identity::new(claims.sub);
        let accounts = self.db.accounts();

        let current = accounts
            .find_by_uuid_and_refresh_token(identity.as_str(), token)
            .await
            .map_err(|e| AuthError::unavailable("Failed to look up session", e))?;
        if current.is_none() {
            return Err(self.store_mismatch(&identity).await);
        }

        let tokens = self
            .issuer
            .issue_pair(&identity)
            .map_err(|e| AuthError::unavailable("Failed to issue tokens", e))?;

        let rotated = accounts
            .rotate_refresh_token(identity.as_str(), token, &tokens.refresh.token)
            .await
            .map_err(|e| AuthError::unavailable("Failed to rotate refresh token", e))?;
        if !rotated {
            // Another request rotated or cleared the token between lookup and update.
            return Err(self.store_mismatch(&identity).await);
        }

        info!(account = %identity, "Refresh token rotated");
        Ok(tokens)
    }

    async fn store_mismatch(&self, identity: &Identity) -> AuthError {
        warn!(account = %identity, "Refresh token does not match the stored token");

        if self.revoke_on_reuse {
            match self
                .db
                .accounts()
                .set_refresh_token(identity.as_str(), None)
                .await
            {
                Ok(_) => info!(account = %identity, "Revoked session after refresh token reuse"),
                Err(e) => warn!(account = %identity, error = %e, "Failed to revoke session"),
            }
        }

        AuthError::Unauthorized(INVALID_REFRESH_TOKEN)
    }

    /// Clear the stored refresh token if `presented` is still the live one.
    ///
    /// Never fails: returns whether a stored token was actually cleared.
    pub async fn logout(&self, presented: Option<&str>) -> bool {
        let Some(token) = presented else {
            return false;
        };

        let claims = match self.issuer.refresh().decode_allow_expired(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Ignoring unverifiable refresh token on logout");
                return false;
            }
        };

        match self
            .db
            .accounts()
            .clear_refresh_token(&claims.sub, token)
            .await
        {
            Ok(cleared) => {
                if cleared {
                    info!(account = %claims.sub, "Logged out");
                }
                cleared
            }
            Err(e) => {
                warn!(account = %claims.sub, error = %e, "Failed to clear refresh token on logout");
                false
            }
        }
    }
}
