//! Async token-bucket rate limiting, one bucket per adapter (§4.1).
//!
//! Grounded on the reference implementation's `TokenBucket`/`RateLimiter`:
//! capacity equals the refill rate, tokens accrue continuously and are
//! capped at capacity, and a caller blocks only long enough for a single
//! token to become available. The Rust difference is that the wait is
//! `tokio::time::sleep`, not a blocking `time.sleep`, so the orchestrator's
//! concurrent adapter tasks never stall the runtime.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;

/// A single adapter's bucket: `capacity` tokens, refilled continuously at
/// `refill_rate` tokens/second, never exceeding `capacity`.
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(requests_per_second: f64) -> Self {
        Self {
            capacity: requests_per_second,
            tokens: requests_per_second,
            refill_rate: requests_per_second,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Take one token if available, returning `true`. Otherwise returns
    /// `false` and the seconds the caller should wait before trying again.
    fn try_take(&mut self) -> Result<(), f64> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err((1.0 - self.tokens) / self.refill_rate)
        }
    }
}

/// Per-adapter async rate limiter. Cheap to clone (wraps an `Arc`-backed
/// mutex internally via `tokio::sync::Mutex` behind a reference held by the
/// owning adapter), and independent from every other adapter's limiter.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(requests_per_second)),
        }
    }

    /// Block the calling task until a token is available, then consume it.
    /// Must be awaited immediately before sending the request it is gating
    /// (§4.1: "synchronous-before-send gate").
    pub async fn wait(&self) {
        loop {
            let wait_for = {
                let mut bucket = self.bucket.lock().await;
                match bucket.try_take() {
                    Ok(()) => return,
                    Err(seconds) => seconds,
                }
            };
            sleep(Duration::from_secs_f64(wait_for.max(0.0))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn allows_capacity_requests_immediately() {
        let limiter = RateLimiter::new(5.0);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn blocks_past_capacity() {
        let limiter = RateLimiter::new(10.0);
        for _ in 0..10 {
            limiter.wait().await;
        }
        let start = Instant::now();
        limiter.wait().await;
        // at 10/s, the 11th token costs ~100ms.
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn independent_limiters_do_not_share_state() {
        let pubmed = Arc::new(RateLimiter::new(3.0));
        let crossref = Arc::new(RateLimiter::new(50.0));
        for _ in 0..3 {
            pubmed.wait().await;
        }
        let start = Instant::now();
        crossref.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
