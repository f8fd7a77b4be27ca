//! Retry policies.
//!
//! The client holds no retry state of its own. After a failed attempt it asks
//! the configured policy, and re-runs the whole call on `Retry`. Bounding the
//! number of attempts and waiting between them is the policy's job. The client
//! tells the policy when a call ends through `call_finished`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::endpoint::Endpoint;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    DoNotRetry,
}

/// Decides whether a failed call is attempted again.
///
/// May suspend, e.g. to back off or to refresh credentials before answering.
#[async_trait]
pub trait RetryPolicy: Send + Sync {
    async fn decide(&self, endpoint: &dyn Endpoint, error: &ApiError) -> RetryDecision;

    /// Called once when a call ends, whether it succeeded, failed or was
    /// dropped mid-flight.
    fn call_finished(&self, _endpoint: &dyn Endpoint) {}
}

/// Retries transient failures a bounded number of consecutive times with
/// exponential backoff.
///
/// Only endpoints with `should_retry_on_failure()` are retried. Transport and
/// decoding failures are retried, as are 408, 429 and 5xx replies. 401/403
/// are retried only with `retry_unauthorized`.
///
/// The attempt counter resets when a call finishes, so each call starts with
/// the full budget. It is shared by concurrent calls on the same instance;
/// give those separate instances if their budgets must not interfere.
#[derive(Debug)]
pub struct BoundedRetry {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    retry_unauthorized: bool,
    attempts: AtomicU32,
}

impl BoundedRetry {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            retry_unauthorized: false,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn retry_unauthorized(mut self, enabled: bool) -> Self {
        self.retry_unauthorized = enabled;
        self
    }

    /// Retries granted to the call in flight.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn is_retryable(&self, error: &ApiError) -> bool {
        match error {
            ApiError::Transport(_) | ApiError::Decoding(_) => true,
            ApiError::Unauthorized { .. } => self.retry_unauthorized,
            ApiError::Http { status, .. } => matches!(status, 408 | 429 | 500..=599),
            ApiError::InvalidUrl(_)
            | ApiError::InvalidHeader { .. }
            | ApiError::Encoding(_)
            | ApiError::Adapter(_) => false,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[async_trait]
impl RetryPolicy for BoundedRetry {
    async fn decide(&self, endpoint: &dyn Endpoint, error: &ApiError) -> RetryDecision {
        let attempt = self.attempts.load(Ordering::SeqCst);
        if !endpoint.should_retry_on_failure()
            || !self.is_retryable(error)
            || attempt >= self.max_retries
        {
            self.attempts.store(0, Ordering::SeqCst);
            return RetryDecision::DoNotRetry;
        }

        self.attempts.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        RetryDecision::Retry
    }

    fn call_finished(&self, _endpoint: &dyn Endpoint) {
        self.attempts.store(0, Ordering::SeqCst);
    }
}
