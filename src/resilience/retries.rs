//! Retry policy for hop-2 delivery.
//!
//! # Responsibilities
//! - Turn `RetryConfig` into a bounded attempt schedule
//! - Compute the backoff delay that precedes each retry
//!
//! # Design Decisions
//! - `max_attempts` counts the first attempt too
//! - The first attempt never waits

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// One planned attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based attempt number.
    pub number: u32,
    /// How long to wait before issuing this attempt.
    pub delay_before: Duration,
}

/// Bounded retry policy with exponential backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Attempts in order; the iterator ends once the budget is spent.
    pub fn schedule(&self) -> impl Iterator<Item = RetryAttempt> + '_ {
        (1..=self.max_attempts).map(move |number| RetryAttempt {
            number,
            delay_before: calculate_backoff(number - 1, self.base_delay, self.max_delay),
        })
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay_ms, config.max_delay_ms)
    }
}
