//! Declarative retry policy.
//!
//! A [`RetryPolicy`] is an immutable description of how a method retries:
//! which status codes are transient and what backoff schedule to follow.
//! [`invoke`](crate::invoke()) turns it into a `backon` exponential backoff.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::status::Code;

/// Retry settings for one remote method.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f32,
    max_attempts: usize,
    retry_codes: Vec<Code>,
}

impl RetryPolicy {
    /// Creates a policy that retries on the given codes with default backoff.
    ///
    /// Default settings:
    /// - Initial delay: 100 milliseconds
    /// - Max delay: 60 seconds
    /// - Multiplier: 1.3
    /// - Max attempts: 5 (including the first)
    pub fn new(retry_codes: impl IntoIterator<Item = Code>) -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            multiplier: 1.3,
            max_attempts: 5,
            retry_codes: retry_codes.into_iter().collect(),
        }
    }

    /// Sets the maximum number of attempts, including the first one.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Maximum number of attempts, including the first one.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound on a single backoff delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Codes this policy treats as transient.
    pub fn retry_codes(&self) -> &[Code] {
        &self.retry_codes
    }

    /// Determines if a failed attempt with `code` should be retried.
    ///
    /// Cancellation is terminal regardless of the configured codes.
    pub fn should_retry(&self, code: Code) -> bool {
        code != Code::Cancelled && self.retry_codes.contains(&code)
    }

    /// Builds the backoff schedule for one call.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.multiplier)
            .with_max_times(self.max_attempts - 1)
            .with_jitter()
    }
}
