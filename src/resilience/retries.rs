//! Retry execution.
//!
//! # Responsibilities
//! - Classify attempt failures into an [`ErrorKind`]
//! - Execute retries with exponential backoff (blocking and async variants)
//! - Surface the final failure as a [`RetryError`]

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::metrics;
use crate::resilience::policy::{RetryDecision, RetryPolicy, StopReason};

/// Classified failure kind of a test operation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ErrorKind {
    Assertion,
    Timeout,
    Connection,
    ElementNotFound,
    StaleElement,
    InvalidState,
    /// Any other named failure class.
    Custom(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Assertion => "assertion",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::ElementNotFound => "element_not_found",
            ErrorKind::StaleElement => "stale_element",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Ok(match normalized.as_str() {
            "assertion" => ErrorKind::Assertion,
            "timeout" => ErrorKind::Timeout,
            "connection" => ErrorKind::Connection,
            "element_not_found" => ErrorKind::ElementNotFound,
            "stale_element" => ErrorKind::StaleElement,
            "invalid_state" => ErrorKind::InvalidState,
            _ => ErrorKind::Custom(s.trim().to_string()),
        })
    }
}

impl From<String> for ErrorKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        kind.to_string()
    }
}

/// Maps an operation's error type onto an [`ErrorKind`].
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for ErrorKind {
    fn kind(&self) -> ErrorKind {
        self.clone()
    }
}

impl Classify for std::io::Error {
    fn kind(&self) -> ErrorKind {
        use std::io::ErrorKind as Io;
        match std::io::Error::kind(self) {
            Io::TimedOut | Io::WouldBlock => ErrorKind::Timeout,
            Io::ConnectionRefused
            | Io::ConnectionReset
            | Io::ConnectionAborted
            | Io::NotConnected
            | Io::BrokenPipe => ErrorKind::Connection,
            Io::NotFound => ErrorKind::ElementNotFound,
            other => ErrorKind::Custom(format!("io:{other:?}").to_ascii_lowercase()),
        }
    }
}

/// Final failure of a retried operation.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed with an error the policy does not retry.
    #[error("attempt {attempts} failed with non-retryable {kind} error: {error}")]
    NonRetryable { attempts: u32, kind: ErrorKind, error: E },

    /// Every allowed attempt failed; wraps the last failure.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: E },

    /// An overall deadline elapsed before the executor finished.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl<E> RetryError<E> {
    /// Number of attempts made, if the executor finished.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::NonRetryable { attempts, .. } | RetryError::ExhaustedRetries { attempts, .. } => {
                Some(*attempts)
            }
            RetryError::DeadlineExceeded(_) => None,
        }
    }

    /// The operation's own last error.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::NonRetryable { error, .. } => Some(error),
            RetryError::ExhaustedRetries { last, .. } => Some(last),
            RetryError::DeadlineExceeded(_) => None,
        }
    }
}

/// Attempt accounting for a finished execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetryStats {
    pub attempts: u32,
    /// Delays actually slept, in order.
    pub delays: Vec<Duration>,
}

impl RetryStats {
    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }
}

fn stop<E>(reason: StopReason, attempts: u32, kind: ErrorKind, error: E) -> RetryError<E> {
    match reason {
        StopReason::Exhausted => {
            tracing::warn!(attempts, kind = %kind, "Retries exhausted");
            metrics::record_retry_exhausted();
            RetryError::ExhaustedRetries { attempts, last: error }
        }
        StopReason::NonRetryable | StopReason::NotRetryable => {
            tracing::debug!(attempts, kind = %kind, reason = ?reason, "Failure is not retryable");
            RetryError::NonRetryable { attempts, kind, error }
        }
    }
}

/// Run `op` under `policy`, sleeping the calling thread between attempts.
///
/// `op` receives the 1-based attempt number.
pub fn execute_with_retry<T, E, F>(policy: &RetryPolicy, op: F) -> Result<T, RetryError<E>>
where
    E: Classify,
    F: FnMut(u32) -> Result<T, E>,
{
    execute_with_stats(policy, op).map(|(value, _)| value)
}

/// Same as [`execute_with_retry`] but also reports attempts and delays slept.
pub fn execute_with_stats<T, E, F>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<(T, RetryStats), RetryError<E>>
where
    E: Classify,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut stats = RetryStats::default();
    let mut attempt = 1;
    loop {
        stats.attempts = attempt;
        metrics::record_retry_attempt(attempt);
        let error = match op(attempt) {
            Ok(value) => return Ok((value, stats)),
            Err(error) => error,
        };

        let kind = error.kind();
        match policy.decide(&kind, attempt) {
            RetryDecision::Stop(reason) => return Err(stop(reason, attempt, kind, error)),
            RetryDecision::Retry(delay) => {
                tracing::debug!(attempt, kind = %kind, delay_ms = delay.as_millis() as u64, "Retrying after failure");
                std::thread::sleep(delay);
                stats.delays.push(delay);
                attempt += 1;
            }
        }
    }
}

/// Async variant of [`execute_with_retry`]; waits with `tokio::time::sleep`.
pub async fn execute_with_retry_async<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Classify,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        metrics::record_retry_attempt(attempt);
        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let kind = error.kind();
        match policy.decide(&kind, attempt) {
            RetryDecision::Stop(reason) => return Err(stop(reason, attempt, kind, error)),
            RetryDecision::Retry(delay) => {
                tracing::debug!(attempt, kind = %kind, delay_ms = delay.as_millis() as u64, "Retrying after failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
