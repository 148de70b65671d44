//! Retry policy definition and the per-failure retry decision.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;

use crate::error::EngineError;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::retries::ErrorKind;

/// Immutable retry configuration for a single test operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Duration,
    retryable: BTreeSet<ErrorKind>,
    non_retryable: BTreeSet<ErrorKind>,
    retry_on_any_error: bool,
    jitter_ratio: f64,
}

/// Why the executor stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The error kind is listed as non-retryable.
    NonRetryable,
    /// A retryable set is declared and the error kind is not in it.
    NotRetryable,
    /// `max_attempts` has been reached.
    Exhausted,
}

/// Outcome of classifying one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    Stop(StopReason),
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A policy that runs the operation once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn jitter_ratio(&self) -> f64 {
        self.jitter_ratio
    }

    pub fn retryable(&self) -> &BTreeSet<ErrorKind> {
        &self.retryable
    }

    pub fn non_retryable(&self) -> &BTreeSet<ErrorKind> {
        &self.non_retryable
    }

    pub fn retry_on_any_error(&self) -> bool {
        self.retry_on_any_error
    }

    /// Whether a failure of this kind may be retried at all, ignoring the attempt count.
    pub fn is_retryable(&self, kind: &ErrorKind) -> bool {
        if self.non_retryable.contains(kind) {
            return false;
        }
        self.retry_on_any_error || self.retryable.is_empty() || self.retryable.contains(kind)
    }

    /// Decide what to do after `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, kind: &ErrorKind, attempt: u32) -> RetryDecision {
        if self.non_retryable.contains(kind) {
            return RetryDecision::Stop(StopReason::NonRetryable);
        }
        if !self.is_retryable(kind) {
            return RetryDecision::Stop(StopReason::NotRetryable);
        }
        if attempt >= self.max_attempts {
            return RetryDecision::Stop(StopReason::Exhausted);
        }
        RetryDecision::Retry(calculate_backoff(self, attempt))
    }

    /// The delays slept between attempts when every attempt fails retryably.
    /// Excludes jitter.
    pub fn delays(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .map(|attempt| crate::resilience::backoff::base_delay(self, attempt))
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(30_000),
            retryable: BTreeSet::new(),
            non_retryable: BTreeSet::new(),
            retry_on_any_error: false,
            jitter_ratio: 0.0,
        }
    }
}

/// Builder validating a [`RetryPolicy`] on `build()`.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.policy.backoff_multiplier = multiplier;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    pub fn retry_on(mut self, kind: ErrorKind) -> Self {
        self.policy.retryable.insert(kind);
        self
    }

    pub fn never_retry_on(mut self, kind: ErrorKind) -> Self {
        self.policy.non_retryable.insert(kind);
        self
    }

    pub fn retry_on_any_error(mut self, enabled: bool) -> Self {
        self.policy.retry_on_any_error = enabled;
        self
    }

    pub fn jitter_ratio(mut self, ratio: f64) -> Self {
        self.policy.jitter_ratio = ratio;
        self
    }

    pub fn build(self) -> Result<RetryPolicy, EngineError> {
        let p = self.policy;
        if p.max_attempts == 0 {
            return Err(EngineError::policy("max_attempts must be at least 1"));
        }
        if !p.backoff_multiplier.is_finite() || p.backoff_multiplier < 1.0 {
            return Err(EngineError::policy(format!(
                "backoff_multiplier must be >= 1.0, got {}",
                p.backoff_multiplier
            )));
        }
        if p.max_delay < p.initial_delay {
            return Err(EngineError::policy(format!(
                "max_delay ({:?}) must not be below initial_delay ({:?})",
                p.max_delay, p.initial_delay
            )));
        }
        if !(0.0..=1.0).contains(&p.jitter_ratio) {
            return Err(EngineError::policy(format!(
                "jitter_ratio must be within [0, 1], got {}",
                p.jitter_ratio
            )));
        }
        Ok(p)
    }
}
