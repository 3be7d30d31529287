//! Per-host token-bucket rate limiting.
//!
//! One limiter per external host: NWS at 1 req/sec, Open-Meteo at 5 req/sec.
//! Every outbound call acquires a token before connecting; acquisition
//! suspends the caller until the per-host minimum interval has elapsed
//! since the last acquisition, generalized from per-operation-type
//! buckets to per-host buckets.

use governor::{Quota, RateLimiter as GovLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

type Limiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A single host's token bucket.
#[derive(Clone)]
pub struct HostRateLimiter {
    inner: Arc<Limiter>,
}

impl HostRateLimiter {
    /// `rate_per_sec` must be a positive integer number of requests/second;
    /// fractional rates below 1 are rounded up to 1 (the quota type itself
    /// only accepts whole numbers per period).
    pub fn new(rate_per_sec: f64) -> Self {
        let n = (rate_per_sec.round() as u32).max(1);
        let quota = Quota::per_second(NonZeroU32::new(n).unwrap_or(nonzero!(1u32)));
        Self {
            inner: Arc::new(GovLimiter::direct(quota)),
        }
    }

    /// Suspend until a token is available.
    pub async fn acquire(&self) {
        self.inner.until_ready().await;
    }
}

/// The two external hosts this system calls, each with its own bucket.
#[derive(Clone)]
pub struct RateLimiters {
    pub nws: HostRateLimiter,
    pub open_meteo: HostRateLimiter,
}

impl RateLimiters {
    pub fn new(nws_rate: f64, open_meteo_rate: f64) -> Self {
        Self {
            nws: HostRateLimiter::new(nws_rate),
            open_meteo: HostRateLimiter::new(open_meteo_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn successive_acquires_respect_minimum_interval() {
        let limiter = HostRateLimiter::new(2.0); // 2 req/sec -> 500ms min interval
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();
        assert!(
            elapsed.as_millis() as f64 >= 500.0 * 0.9,
            "elapsed {:?} should be close to the 500ms minimum interval",
            elapsed
        );
    }
}
