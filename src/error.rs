//! Engine-level error definitions.

use thiserror::Error;

/// Errors raised at the boundary of the engine's entry points.
///
/// Failures of the wrapped test operation are not represented here; they are
/// surfaced through [`crate::resilience::RetryError`] so the caller keeps its
/// own error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A retry policy or performance threshold set was malformed at construction.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// Structurally malformed argument passed to a validator.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    pub(crate) fn policy(msg: impl Into<String>) -> Self {
        Self::InvalidPolicy(msg.into())
    }

    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
