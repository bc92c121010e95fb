//! Per-client, per-tier request rate limiting
//!
//! Counters are process-local and best-effort; a restart forgets them.
//! Every request is checked before any other component runs.

use crate::error::ProfileError;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

type ClientRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// A named (window, max-requests) policy applied per endpoint class
#[derive(Debug, Clone, Copy)]
pub struct RateTier {
    pub window: Duration,
    pub max_requests: u32,
}

impl RateTier {
    /// General and authenticated endpoints: 100 requests per minute.
    pub fn default_tier() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 100,
        }
    }

    /// Read-only public discovery endpoints: 300 requests per minute.
    pub fn public_read_tier() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 300,
        }
    }

    fn quota(&self) -> Quota {
        let max = NonZeroU32::new(self.max_requests.max(1)).unwrap_or(NonZeroU32::MIN);
        // Replenish one cell per window/max, with the full window as burst
        let per_cell = self.window / self.max_requests.max(1);
        Quota::with_period(per_cell.max(Duration::from_nanos(1)))
            .unwrap_or_else(|| Quota::per_minute(max))
            .allow_burst(max)
    }
}

/// Which tier a route belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    Default,
    PublicRead,
}

/// Keyed rate limiters for both tiers, one instance per process.
///
/// Construct isolated instances in tests; there is no hidden global.
pub struct RequestRateLimiter {
    default_limiter: ClientRateLimiter,
    public_read_limiter: ClientRateLimiter,
}

impl RequestRateLimiter {
    pub fn new(default_tier: RateTier, public_read_tier: RateTier) -> Self {
        Self {
            default_limiter: RateLimiter::keyed(default_tier.quota()),
            public_read_limiter: RateLimiter::keyed(public_read_tier.quota()),
        }
    }

    /// Admit or reject a request from `client_key` against the tier for
    /// `class`. Rejections are terminal for the attempt and carry a
    /// retry-after hint.
    pub fn check(&self, client_key: &str, class: EndpointClass) -> Result<(), ProfileError> {
        let limiter = match class {
            EndpointClass::Default => &self.default_limiter,
            EndpointClass::PublicRead => &self.public_read_limiter,
        };

        match limiter.check_key(&client_key.to_string()) {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let retry_after = not_until.wait_time_from(Clock::now(&DefaultClock::default()));
                debug!(
                    "rate limited client {} on {:?} tier, retry in {:?}",
                    client_key, class, retry_after
                );
                Err(ProfileError::RateLimited { retry_after })
            }
        }
    }
}

impl Default for RequestRateLimiter {
    fn default() -> Self {
        Self::new(RateTier::default_tier(), RateTier::public_read_tier())
    }
}
