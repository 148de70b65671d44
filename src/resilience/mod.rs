//! Resilience subsystem: the retry executor.
//!
//! # Data Flow
//! ```text
//! Test operation body:
//!     → retries.rs (run attempt, classify failure into an ErrorKind)
//!     → policy.rs (decide: retry, non-retryable, exhausted)
//!     → backoff.rs (delay before the next attempt, clamped to max_delay)
//!     → timeouts.rs (optional overall deadline for the async executor)
//! ```
//!
//! # Design Decisions
//! - Policies are immutable values validated once at construction
//! - Non-retryable kinds always win over the retryable set
//! - Every attempt's side effects are committed before the next decision
//! - The executor owns no state beyond the policy passed per call

pub mod backoff;
pub mod policy;
pub mod retries;
pub mod timeouts;

pub use backoff::calculate_backoff;
pub use policy::{RetryDecision, RetryPolicy, RetryPolicyBuilder, StopReason};
pub use retries::{
    execute_with_retry, execute_with_retry_async, execute_with_stats, Classify, ErrorKind,
    RetryError, RetryStats,
};
pub use timeouts::with_deadline;
