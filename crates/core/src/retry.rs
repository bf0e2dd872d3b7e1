//! Retry policy shared by every request the client sends.

use std::time::Duration;

use reqwest::StatusCode;

/// How many times a request may be retried and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, min_backoff: Duration, max_backoff: Duration) -> Self {
        RetryPolicy {
            max_retries,
            min_backoff,
            max_backoff,
        }
    }

    /// Whether another attempt is allowed after `retry` retries have already run.
    pub fn should_retry(&self, retry: u32) -> bool {
        retry < self.max_retries
    }

    /// Total number of attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Exponential delay before the given retry (0-indexed), capped at `max_backoff`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.min_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Delay before the given retry, preferring the server's `Retry-After` hint.
    pub fn backoff_with_hint(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint.min(self.max_backoff),
            None => self.backoff(retry),
        }
    }
}

impl Default for RetryPolicy {
    /// 5 retries, 1s doubling up to 30s.
    fn default() -> Self {
        RetryPolicy {
            max_retries: 5,
            min_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Statuses worth another attempt: rate limiting and server errors.
///
/// 501 is excluded since the server will never implement the method on retry.
pub fn is_retriable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

/// Parses a delta-seconds `Retry-After` value. HTTP dates are not supported.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
