// ABOUTME: Bounded exponential backoff with jitter and per-attempt timeouts
// ABOUTME: Used by the background persister for durable profile and history writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use crate::constants::persistence;
use crate::errors::{AppError, AppResult};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{error, warn};

/// Retry settings for a store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap on the exponential delay (before jitter)
    pub max_delay: Duration,
    /// Timeout applied to every attempt
    pub attempt_timeout: Duration,
    /// Add 0-100ms of random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: persistence::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(persistence::DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(persistence::DEFAULT_MAX_DELAY_MS),
            attempt_timeout: Duration::from_secs(persistence::DEFAULT_ATTEMPT_TIMEOUT_SECS),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (0-based)
    ///
    /// `delay = min(base * 2^attempt, max) + jitter(0..=100ms)`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let capped = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if self.jitter {
            let jitter_ms = rand::thread_rng().gen_range(0..=persistence::MAX_JITTER_MS);
            capped + Duration::from_millis(jitter_ms)
        } else {
            capped
        }
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or
    /// attempts run out
    ///
    /// Each attempt is bounded by `attempt_timeout`; a timeout counts as a
    /// retryable `StoreTimeout` failure.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first
    /// non-retryable error
    pub async fn run<F, Fut, T>(&self, operation: &str, mut f: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match timeout(self.attempt_timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(AppError::store_timeout(
                    operation,
                    self.attempt_timeout.as_millis(),
                )),
            };

            let e = match result {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !e.is_retryable() {
                error!(
                    operation,
                    attempt,
                    error = %e,
                    "Store operation failed with non-retryable error"
                );
                return Err(e);
            }
            if attempt >= max_attempts {
                error!(
                    operation,
                    attempts = attempt,
                    error = %e,
                    "Store operation failed after max attempts"
                );
                return Err(e);
            }

            let delay = self.delay_for_attempt(attempt - 1);
            warn!(
                operation,
                attempt,
                max_attempts,
                backoff_ms = delay.as_millis() as u64,
                error = %e,
                "Store operation failed, retrying after backoff"
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
            attempt_timeout: Duration::from_secs(1),
            jitter: false,
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = fast_policy(5);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_millis(400));
    }

    #[test]
    fn test_jitter_stays_bounded() {
        let policy = RetryPolicy::default();
        for attempt in 0..4 {
            let delay = policy.delay_for_attempt(attempt);
            let floor = fast_policy(1).base_delay.saturating_mul(1 << attempt);
            assert!(delay >= floor);
            assert!(delay <= floor + Duration::from_millis(persistence::MAX_JITTER_MS));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast_policy(3)
            .run("test_write", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::store_unavailable("profile_store", "offline"))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_non_retryable() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: AppResult<()> = fast_policy(5)
            .run("test_write", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::invalid_input("bad row"))
            })
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidInput);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out_slow_attempts() {
        let result: AppResult<()> = fast_policy(2)
            .run("slow_write", || async {
                sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::StoreTimeout);
    }
}
