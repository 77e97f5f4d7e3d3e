//! Caller-side retry for storage-touching commands
//!
//! The engine never retries on its own. Tracking is idempotent, so a
//! command may safely repeat a write whose outcome it never observed.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use varlab_core::ExperimentError;

/// Backoff delays: 100ms, 250ms, 1s, 2s
const BACKOFF_DELAYS: [Duration; 4] = [
    Duration::from_millis(100),
    Duration::from_millis(250),
    Duration::from_secs(1),
    Duration::from_secs(2),
];

/// Bounded exponential backoff for `StorageUnavailable` errors
#[derive(Debug)]
pub struct RetryPolicy {
    max_retries: usize,
    retries: usize,
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` retries after the first attempt
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            retries: 0,
        }
    }

    /// Default policy: one retry per backoff step
    pub fn default_policy() -> Self {
        Self::new(BACKOFF_DELAYS.len())
    }

    /// Delay before the next retry, or `None` once the budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }

        let delay = BACKOFF_DELAYS
            .get(self.retries)
            .copied()
            .unwrap_or(BACKOFF_DELAYS[BACKOFF_DELAYS.len() - 1]);
        self.retries += 1;

        Some(delay)
    }

    /// Number of retries handed out so far
    pub fn retries(&self) -> usize {
        self.retries
    }
}

/// Run `op`, retrying only errors the engine marks retryable
pub async fn with_retry<T, F, Fut>(
    mut policy: RetryPolicy,
    mut op: F,
) -> Result<T, ExperimentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ExperimentError>>,
{
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => match policy.next_delay() {
                Some(delay) => {
                    warn!(
                        attempt = policy.retries(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "storage unavailable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(e),
            },
            Err(e) => return Err(e),
        }
    }
}
