//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate retry policies and performance thresholds
//! - Detect duplicate operation ids and blank role names
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: EngineConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::EngineConfig;
use crate::error::EngineError;
use crate::observability::logging::is_valid_level;
use crate::operation::TestOperationId;

/// Maximum accepted `security.max_decode_rounds`.
pub const MAX_DECODE_ROUNDS: usize = 10;

/// A single semantic problem, located by its config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn from_engine(field: impl Into<String>, err: EngineError) -> Self {
        let message = match err {
            EngineError::InvalidPolicy(m) | EngineError::InvalidArgument(m) => m,
        };
        Self::new(field, message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_valid_level(&config.observability.log_level) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    let rounds = config.security.max_decode_rounds;
    if rounds == 0 || rounds > MAX_DECODE_ROUNDS {
        errors.push(ValidationError::new(
            "security.max_decode_rounds",
            format!("must be within 1..={MAX_DECODE_ROUNDS}, got {rounds}"),
        ));
    }

    if let Err(e) = config.retry.to_policy() {
        errors.push(ValidationError::from_engine("retry", e));
    }

    let mut seen = HashSet::new();
    for (i, op) in config.operations.iter().enumerate() {
        let path = format!("operations[{i}]");

        match TestOperationId::new(&op.id) {
            Ok(id) => {
                if !seen.insert(id.clone()) {
                    errors.push(ValidationError::new(
                        format!("{path}.id"),
                        format!("duplicate operation id '{id}'"),
                    ));
                }
            }
            Err(e) => errors.push(ValidationError::from_engine(format!("{path}.id"), e)),
        }

        if let Some(retry) = &op.retry {
            if let Err(e) = retry.to_policy() {
                errors.push(ValidationError::from_engine(format!("{path}.retry"), e));
            }
        }

        if let Some(performance) = &op.performance {
            if let Err(e) = performance.to_thresholds() {
                errors.push(ValidationError::from_engine(format!("{path}.performance"), e));
            }
        }

        if op.security.required_roles.iter().any(|r| r.trim().is_empty()) {
            errors.push(ValidationError::new(
                format!("{path}.security.required_roles"),
                "role names must not be blank",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{OperationConfig, PerformanceConfig, RetryConfig};

    fn op(id: &str) -> OperationConfig {
        OperationConfig {
            id: id.to_string(),
            category: Default::default(),
            priority: Default::default(),
            description: None,
            retry: None,
            performance: None,
            security: Default::default(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = EngineConfig::default();
        config.observability.log_level = "loud".into();

        let mut bad_retry = op("Login.valid");
        bad_retry.retry = Some(RetryConfig {
            backoff_multiplier: 0.5,
            ..RetryConfig::default()
        });
        let mut bad_perf = op("Login.valid");
        bad_perf.performance = Some(PerformanceConfig {
            concurrent_users: 0,
            ..PerformanceConfig::default()
        });
        bad_perf.security.required_roles = vec!["  ".into()];
        config.operations = vec![bad_retry, bad_perf, op(" ")];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "observability.log_level",
                "operations[0].retry",
                "operations[1].id",
                "operations[1].performance",
                "operations[1].security.required_roles",
                "operations[2].id",
            ]
        );
    }
}
