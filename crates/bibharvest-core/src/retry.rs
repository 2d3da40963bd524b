//! Retry policy for rate-limited (429) responses

use std::time::Duration;

/// Linear backoff: 1.5 * (attempt + 1) seconds (1.5s, 3s, 4.5s, ...)
pub fn linear_backoff(attempt: u32) -> Duration {
    Duration::from_millis(1500 * (u64::from(attempt) + 1))
}

/// How many times a 429 is retried and how long to wait in between.
///
/// `max_attempts` counts the first request too, so the default of 4
/// means at most three waits.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait used when the server gives no usable `Retry-After`
    pub backoff: fn(u32) -> Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff: linear_backoff,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Whether another request may follow a 429 on `attempt` (0-based).
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// Delay before the request following `attempt` (0-based).
    ///
    /// A `Retry-After` made only of ASCII digits wins; HTTP-date values
    /// and anything else fall back to the backoff function.
    pub fn delay(&self, attempt: u32, retry_after: Option<&str>) -> Duration {
        retry_after
            .and_then(parse_retry_after)
            .unwrap_or_else(|| (self.backoff)(attempt))
    }
}

/// Parse a `Retry-After` header holding a non-negative integer of seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok().map(Duration::from_secs)
}
