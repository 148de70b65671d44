//! Cross-cutting execution engine for test automation.
//!
//! A test runner resolves each test operation's declared metadata into plain
//! values and calls into three independent components:
//!
//! - [`resilience`]: retry executor with exponential backoff
//! - [`performance`]: per-operation timing samples, reports and threshold evaluation
//! - [`security`]: signature-based input/response validation and authorization checks
//!
//! The components share no mutable state with each other.

pub mod config;
pub mod error;
pub mod observability;
pub mod operation;
pub mod performance;
pub mod resilience;
pub mod security;

pub use config::EngineConfig;
pub use error::EngineError;
pub use operation::{OperationMetadata, Priority, TestCategory, TestOperationId};
pub use performance::{PerformanceMonitor, PerformanceReport, PerformanceThresholds};
pub use resilience::{execute_with_retry, ErrorKind, RetryError, RetryPolicy};
pub use security::{SecurityType, SecurityValidator};
