//! Dual rate limiter for the Kalshi API: separate token buckets for reads
//! and writes, matching the basic tier's published limits (20 reads/sec,
//! 10 writes/sec).

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type Inner = GovLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

#[derive(Clone)]
pub struct KalshiRateLimiter {
    read_limiter: Arc<Inner>,
    write_limiter: Arc<Inner>,
}

impl KalshiRateLimiter {
    pub fn new() -> Self {
        Self::with_limits(20, 10)
    }

    pub fn with_limits(reads_per_sec: u32, writes_per_sec: u32) -> Self {
        let read_quota = Quota::per_second(NonZeroU32::new(reads_per_sec.max(1)).unwrap());
        let write_quota = Quota::per_second(NonZeroU32::new(writes_per_sec.max(1)).unwrap());

        Self {
            read_limiter: Arc::new(GovLimiter::direct(read_quota)),
            write_limiter: Arc::new(GovLimiter::direct(write_quota)),
        }
    }

    pub async fn wait_read(&self) {
        self.read_limiter.until_ready().await;
    }

    pub async fn wait_write(&self) {
        self.write_limiter.until_ready().await;
    }
}

impl Default for KalshiRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
