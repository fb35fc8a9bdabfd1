//! Rate limiting for login attempts.
//!
//! Uses a token bucket per account email to slow down password guessing. Emails are chosen
//! by the client, so buckets that have fully refilled are dropped every few hundred checks
//! to keep the key map bounded.

use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of checks between sweeps of idle keys.
const PRUNE_EVERY: u64 = 512;

/// Per-key rate limiter.
pub type KeyedLimiter<C = DefaultClock> = RateLimiter<String, DefaultKeyedStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Login throttle. A disabled throttle admits every attempt.
#[derive(Clone)]
pub struct LoginThrottle<C: Clock = DefaultClock> {
    limiter: Option<Arc<KeyedLimiter<C>>>,
    checks: Arc<AtomicU64>,
}

impl LoginThrottle {
    /// Allow `per_minute` attempts per email, replenished evenly over the minute.
    pub fn per_minute(per_minute: NonZeroU32) -> Self {
        Self::from_limiter(RateLimiter::keyed(Quota::per_minute(per_minute)))
    }

    pub fn disabled() -> Self {
        Self {
            limiter: None,
            checks: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<C: Clock> LoginThrottle<C> {
    fn from_limiter(limiter: KeyedLimiter<C>) -> Self {
        Self {
            limiter: Some(Arc::new(limiter)),
            checks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record an attempt for `email`. Returns false if the caller should be turned away.
    pub fn check(&self, email: &str) -> bool {
        let Some(limiter) = &self.limiter else {
            return true;
        };

        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune();
        }

        limiter.check_key(&email.to_lowercase()).is_ok()
    }

    /// Forget emails whose bucket has fully refilled.
    pub fn prune(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.limiter.as_ref().map_or(0, |limiter| limiter.len())
    }
}
