//! Global request pacing
//!
//! A single [`RateLimiter`] is shared by every component that talks to the network, so the
//! wiki sees at most one request per interval no matter which stage issues it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use chara_scrape::crawler::RateLimiter;
//!
//! # async fn example() {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1)));
//!
//! // First slot is granted immediately
//! limiter.await_slot().await;
//!
//! // Second slot waits until a second has passed since the first
//! limiter.await_slot().await;
//! # }
//! ```

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between outbound requests
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between the start of two requests
    interval: Duration,

    /// When the previous slot was granted. `None` until the first request.
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given interval
    pub fn new(interval: Duration) -> Self {
        tracing::debug!("Creating rate limiter with {:?} interval", interval);
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Creates a rate limiter that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns the configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a request may be issued, then records the grant time
    ///
    /// The remaining wait is recomputed on every call as `interval - elapsed`, so time
    /// already spent parsing or writing files counts towards the interval. The lock is held
    /// across the sleep; concurrent callers are served one after another.
    ///
    /// Returns how long the caller was held back.
    pub async fn await_slot(&self) -> Duration {
        let mut last_call = self.last_call.lock().await;

        let wait = match *last_call {
            Some(last) => self.interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        };

        if !wait.is_zero() {
            tracing::trace!("Rate limit: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }

        *last_call = Some(Instant::now());
        wait
    }
}
