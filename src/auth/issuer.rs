//! Access/refresh token pair issuance.

use super::types::Identity;
use crate::jwt::{IssuedToken, TokenCodec, TokenError};

/// A matching access and refresh token for one account.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issues token pairs from two independently configured codecs.
///
/// Issuing has no side effects; persisting the refresh token is up to the caller.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    access: TokenCodec,
    refresh: TokenCodec,
}

impl TokenIssuer {
    pub fn new(access: TokenCodec, refresh: TokenCodec) -> Self {
        Self { access, refresh }
    }

    pub fn access(&self) -> &TokenCodec {
        &self.access
    }

    pub fn refresh(&self) -> &TokenCodec {
        &self.refresh
    }

    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let access = self.access.issue(identity.as_str(), self.access.lifetime())?;
        let refresh = self
            .refresh
            .issue(identity.as_str(), self.refresh.lifetime())?;
        Ok(TokenPair { access, refresh })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{
        ACCESS_TOKEN_LIFETIME, ManualClock, REFRESH_TOKEN_LIFETIME, TokenClass, TokenError,
    };
    use std::sync::Arc;

    fn issuer() -> TokenIssuer {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        TokenIssuer::new(
            TokenCodec::new(
                TokenClass::Access,
                b"access-secret",
                ACCESS_TOKEN_LIFETIME,
                clock.clone(),
            ),
            TokenCodec::new(
                TokenClass::Refresh,
                b"refresh-secret",
                REFRESH_TOKEN_LIFETIME,
                clock,
            ),
        )
    }

    #[test]
    fn test_issue_pair() {
        let issuer = issuer();
        let identity = Identity::new("uuid-123");

        let pair = issuer.issue_pair(&identity).unwrap();
        assert_eq!(pair.access.lifetime_secs(), ACCESS_TOKEN_LIFETIME.as_secs());
        assert_eq!(pair.refresh.lifetime_secs(), REFRESH_TOKEN_LIFETIME.as_secs());

        assert_eq!(issuer.access().decode(&pair.access.token).unwrap().sub, "uuid-123");
        assert_eq!(issuer.refresh().decode(&pair.refresh.token).unwrap().sub, "uuid-123");
    }

    #[test]
    fn test_pair_tokens_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.issue_pair(&Identity::new("uuid-123")).unwrap();

        assert!(matches!(
            issuer.access().decode(&pair.refresh.token),
            Err(TokenError::InvalidSignature)
        ));
        assert!(matches!(
            issuer.refresh().decode(&pair.access.token),
            Err(TokenError::InvalidSignature)
        ));
    }
}
