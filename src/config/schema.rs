//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from suite files.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::operation::{OperationMetadata, Priority, SecurityRequirements, TestCategory, TestOperationId};
use crate::performance::{PerformanceThresholds, TestType};
use crate::resilience::{ErrorKind, RetryPolicy};
use crate::security::normalize::DEFAULT_DECODE_ROUNDS;
use crate::security::{OwaspCategory, SecurityType};

/// Root configuration of a test suite.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Suite-wide default retry policy.
    pub retry: RetryConfig,

    /// Security validator settings.
    pub security: SecurityConfig,

    /// Per-operation metadata.
    pub operations: Vec<OperationConfig>,
}

impl EngineConfig {
    pub fn default_retry_policy(&self) -> Result<RetryPolicy, EngineError> {
        self.retry.to_policy()
    }

    /// Convert every operation entry into engine metadata.
    pub fn resolve_operations(&self) -> Result<Vec<OperationMetadata>, EngineError> {
        self.operations.iter().map(OperationConfig::resolve).collect()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install the Prometheus recorder.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    pub initial_delay_ms: u64,

    /// Factor applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,

    /// Upper bound on any single delay in milliseconds.
    pub max_delay_ms: u64,

    /// Random extra delay as a fraction of the computed delay.
    pub jitter_ratio: f64,

    /// Error kinds to retry (empty = any).
    pub retry_on: Vec<ErrorKind>,

    /// Error kinds never retried; wins over `retry_on`.
    pub never_retry_on: Vec<ErrorKind>,

    pub retry_on_any_error: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            jitter_ratio: 0.0,
            retry_on: Vec::new(),
            never_retry_on: Vec::new(),
            retry_on_any_error: false,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> Result<RetryPolicy, EngineError> {
        let mut builder = RetryPolicy::builder()
            .max_attempts(self.max_attempts)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .backoff_multiplier(self.backoff_multiplier)
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .jitter_ratio(self.jitter_ratio)
            .retry_on_any_error(self.retry_on_any_error);
        for kind in &self.retry_on {
            builder = builder.retry_on(kind.clone());
        }
        for kind in &self.never_retry_on {
            builder = builder.never_retry_on(kind.clone());
        }
        builder.build()
    }
}

/// Performance thresholds of one operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub max_response_time_ms: u64,
    pub concurrent_users: u32,
    pub duration_ms: u64,
    /// Percent.
    pub max_cpu_usage: f64,
    pub max_memory_bytes: u64,
    /// Requests per second.
    pub expected_throughput: f64,
    pub test_type: TestType,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        let defaults = PerformanceThresholds::default();
        Self {
            max_response_time_ms: defaults.max_response_time().as_millis() as u64,
            concurrent_users: defaults.concurrent_users(),
            duration_ms: defaults.duration().as_millis() as u64,
            max_cpu_usage: defaults.max_cpu_usage(),
            max_memory_bytes: defaults.max_memory_usage(),
            expected_throughput: defaults.expected_throughput(),
            test_type: defaults.test_type(),
        }
    }
}

impl PerformanceConfig {
    pub fn to_thresholds(&self) -> Result<PerformanceThresholds, EngineError> {
        PerformanceThresholds::builder()
            .max_response_time(Duration::from_millis(self.max_response_time_ms))
            .concurrent_users(self.concurrent_users)
            .duration(Duration::from_millis(self.duration_ms))
            .max_cpu_usage(self.max_cpu_usage)
            .max_memory_usage(self.max_memory_bytes)
            .expected_throughput(self.expected_throughput)
            .test_type(self.test_type)
            .build()
    }
}

/// Validator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum URL/HTML decoding passes applied to input.
    pub max_decode_rounds: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decode_rounds: DEFAULT_DECODE_ROUNDS,
        }
    }
}

/// Declared security checks of one operation.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityRequirementsConfig {
    pub types: Vec<SecurityType>,
    pub owasp: Vec<OwaspCategory>,
    pub required_roles: Vec<String>,
}

/// Metadata of one test operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperationConfig {
    /// Qualified test method name.
    pub id: String,

    #[serde(default)]
    pub category: TestCategory,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub retry: Option<RetryConfig>,

    #[serde(default)]
    pub performance: Option<PerformanceConfig>,

    #[serde(default)]
    pub security: SecurityRequirementsConfig,
}

impl OperationConfig {
    pub fn resolve(&self) -> Result<OperationMetadata, EngineError> {
        let mut metadata = OperationMetadata::new(TestOperationId::new(&self.id)?);
        metadata.category = self.category;
        metadata.priority = self.priority;
        metadata.description = self.description.clone();
        metadata.retry = self.retry.as_ref().map(RetryConfig::to_policy).transpose()?;
        metadata.performance = self.performance.as_ref().map(PerformanceConfig::to_thresholds).transpose()?;
        metadata.security = SecurityRequirements {
            types: self.security.types.iter().copied().collect(),
            owasp: self.security.owasp.iter().copied().collect(),
            required_roles: self
                .security
                .required_roles
                .iter()
                .map(|r| r.trim().to_string())
                .collect::<BTreeSet<_>>(),
        };
        Ok(metadata)
    }
}
