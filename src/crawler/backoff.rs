//! Request pacing and retry backoff
//!
//! The policy itself is a pure function of the attempt number
//! ([`BackoffPolicy::next_delay`]); [`RateLimiter`] adds random jitter and
//! performs the actual sleep.
//!
//! | Attempt | Wait before the request |
//! |---------|-------------------------|
//! | 0 | `base_delay + jitter` |
//! | n > 0 | `clamp(base_delay * 2^n, retry_floor, max_delay) + jitter` |
//!
//! A `Retry-After` hint from the server raises a retry wait up to the hint,
//! never beyond `max_delay`. Retry waits for one page never shrink, so a
//! raised wait carries over to the following retries.

use crate::config::PacingConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Largest exponent applied to the base delay
const MAX_EXPONENT: u32 = 16;

/// Pure retry/backoff policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Pause before the first attempt of every page
    pub base_delay: Duration,

    /// Upper bound of the uniform jitter added to every pause
    pub jitter: Duration,

    /// Minimum pause before a retry
    pub retry_floor: Duration,

    /// Cap on the exponential part of a retry pause
    pub max_delay: Duration,

    /// Attempts per page, first try included
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub fn from_config(config: &PacingConfig) -> Self {
        Self {
            base_delay: config.base_delay,
            jitter: config.jitter,
            retry_floor: config.retry_floor,
            max_delay: config.max_backoff,
            max_attempts: config.max_attempts,
        }
    }

    /// Policy without any waiting, for tests and dry runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            base_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            retry_floor: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_attempts,
        }
    }

    /// Deterministic wait before attempt `attempt` (0-based), without jitter
    ///
    /// Non-decreasing in `attempt` for every `attempt >= 1`.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.base_delay;
        }

        let factor = 2u32.saturating_pow(attempt.min(MAX_EXPONENT));
        self.base_delay
            .saturating_mul(factor)
            .max(self.retry_floor)
            .min(self.max_delay)
    }

    /// Returns true if another attempt is allowed after `attempts_made`
    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// Sleeps between requests according to a [`BackoffPolicy`]
#[derive(Debug, Clone)]
pub struct RateLimiter {
    policy: BackoffPolicy,
    rng: StdRng,
    /// Last retry wait of the current page, without jitter
    last_retry: Duration,
}

impl RateLimiter {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            rng: StdRng::from_entropy(),
            last_retry: Duration::ZERO,
        }
    }

    /// Creates a limiter with a fixed jitter seed
    pub fn with_seed(policy: BackoffPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: StdRng::seed_from_u64(seed),
            last_retry: Duration::ZERO,
        }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Computes the full wait before attempt `attempt`, jitter included
    ///
    /// `retry_after` is the server's hint from the previous response and is
    /// only honoured for retries. Attempt 0 starts a new page.
    pub fn delay_for(&mut self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let mut delay = self.policy.next_delay(attempt);

        if attempt == 0 {
            self.last_retry = Duration::ZERO;
        } else {
            if let Some(hint) = retry_after {
                delay = delay.max(hint.min(self.policy.max_delay));
            }
            delay = delay.max(self.last_retry);
            self.last_retry = delay;
        }

        delay + self.jitter()
    }

    /// Sleeps before attempt `attempt` and returns how long it waited
    pub async fn wait_before_request(
        &mut self,
        attempt: u32,
        retry_after: Option<Duration>,
    ) -> Duration {
        let delay = self.delay_for(attempt, retry_after);

        if !delay.is_zero() {
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Pausing before request"
            );
            tokio::time::sleep(delay).await;
        }

        delay
    }

    fn jitter(&mut self) -> Duration {
        if self.policy.jitter.is_zero() {
            return Duration::ZERO;
        }

        let bound = self.policy.jitter.as_secs_f64();
        Duration::from_secs_f64(self.rng.gen_range(0.0..=bound))
    }
}
