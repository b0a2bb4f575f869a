//! Sliding-window admission control for async operations.
//!
//! At most `requests_per_second` operations may *begin* within any one-second
//! window. Waiters queue on a fair mutex, so work is released in the order it
//! was submitted. Admitted operations run outside the lock; the limiter never
//! bounds how many are in flight, never retries, and returns each operation's
//! output untouched.

use std::collections::VecDeque;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(1);

/// Cloneable handle; clones share one admission schedule.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    limit: NonZeroU32,
    // tokio's Mutex queues waiters FIFO, which gives us submission order.
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_second: NonZeroU32) -> Self {
        Self {
            inner: Arc::new(Inner {
                limit: requests_per_second,
                admitted: Mutex::new(VecDeque::with_capacity(requests_per_second.get() as usize)),
            }),
        }
    }

    /// Build from a plain rate, treating zero as one request per second.
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::new(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN))
    }

    pub fn requests_per_second(&self) -> u32 {
        self.inner.limit.get()
    }

    /// Wait for an admission slot, then run `operation`.
    pub async fn admit<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        operation().await
    }

    async fn acquire(&self) {
        let limit = self.inner.limit.get() as usize;
        let mut admitted = self.inner.admitted.lock().await;
        loop {
            let now = Instant::now();
            while admitted
                .front()
                .is_some_and(|started| now.duration_since(*started) >= WINDOW)
            {
                admitted.pop_front();
            }

            if admitted.len() < limit {
                admitted.push_back(now);
                return;
            }

            // Hold the lock while sleeping so later submitters stay queued behind us.
            if let Some(oldest) = admitted.front().copied() {
                tracing::trace!(queued = admitted.len(), "rate limit reached, waiting");
                tokio::time::sleep_until(oldest + WINDOW).await;
            }
        }
    }
}
