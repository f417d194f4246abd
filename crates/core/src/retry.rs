//! Bounded retry with exponential backoff for outbound generation calls.

use std::time::Duration;

/// Retry budget and backoff schedule injected into the generation client.
///
/// Only transport-level failures (connect errors, timeouts) are eligible for
/// retry; protocol and extraction failures surface immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based):
    /// `base_delay * 2^(attempt - 1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    /// Three attempts with a one-second base delay.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
