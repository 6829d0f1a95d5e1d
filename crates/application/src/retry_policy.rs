use std::time::Duration;

/// Attempt budget and linear backoff for retryable outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u8,
    backoff: Duration,
}

impl RetryPolicy {
    /// Creates a retry policy. At least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u8, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Returns the total number of attempts allowed.
    #[must_use]
    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    /// Returns whether another attempt may follow the given (1-based) attempt.
    #[must_use]
    pub fn allows_retry_after(&self, attempt: u8) -> bool {
        attempt < self.max_attempts
    }

    /// Returns the delay to wait after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: u8) -> Duration {
        self.backoff.saturating_mul(u32::from(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}
