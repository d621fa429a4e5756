//! # Retry Policy and Backoff Strategies
//!
//! Decides when a pending operation that failed to replay may be attempted
//! again, and when to give up on it.
//!
//! ## Features
//!
//! - **Exponential Backoff**: Gradually increase retry intervals
//! - **Jitter**: Add randomness to prevent thundering herd
//! - **Max Attempts**: Abandon an operation after a bounded number of failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luxemarket::client::offline::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::default();
//! let next = policy.next_attempt_at(1, chrono::Utc::now());
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

/// Backoff strategy configuration
#[derive(Clone)]
pub enum BackoffStrategy {
    /// Fixed interval between retries
    Fixed {
        /// Interval between attempts
        interval: Duration,
    },
    /// Exponential backoff with jitter
    Exponential {
        /// Delay after the first failure
        base: Duration,
        /// Upper bound for any single delay
        max: Duration,
        /// Jitter factor (0.0 to 1.0)
        jitter: f64,
    },
    /// Custom backoff function (attempt number -> delay)
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl std::fmt::Debug for BackoffStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackoffStrategy::Fixed { interval } => {
                f.debug_struct("Fixed").field("interval", interval).finish()
            }
            BackoffStrategy::Exponential { base, max, jitter } => f
                .debug_struct("Exponential")
                .field("base", base)
                .field("max", max)
                .field("jitter", jitter)
                .finish(),
            BackoffStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl BackoffStrategy {
    /// Delay before attempt number `attempt + 1`, where `attempt >= 1`
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed { interval } => *interval,
            BackoffStrategy::Exponential { base, max, jitter } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                let delay = base.saturating_mul(factor).min(*max);

                let jitter_span = delay.mul_f64(jitter.clamp(0.0, 1.0));
                if jitter_span.is_zero() {
                    delay
                } else {
                    let extra = rand::thread_rng().gen_range(0..=jitter_span.as_millis() as u64);
                    delay + Duration::from_millis(extra)
                }
            }
            BackoffStrategy::Custom(calc) => calc(attempt),
        }
    }
}

/// Backoff plus an attempt limit
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub strategy: BackoffStrategy,
    /// Failures after which an operation is abandoned
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential {
                base: Duration::from_secs(1),
                max: Duration::from_secs(300), // 5 minutes
                jitter: 0.1,
            },
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately, used where time must not pass
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            strategy: BackoffStrategy::Fixed { interval: Duration::ZERO },
            max_attempts,
        }
    }

    /// Whether an operation with `attempts` failures should be dropped
    pub fn exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    /// When to try again after the `attempts`-th failure
    pub fn next_attempt_at(&self, attempts: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        let delay = self.strategy.delay(attempts);
        now + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::seconds(300))
    }
}
