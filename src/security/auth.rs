//! Authorization claim validation.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::EngineError;

/// `Bearer <token68>` (RFC 6750); the scheme is case-insensitive.
static BEARER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:bearer) ([A-Za-z0-9\-._~+/]+=*)$")
        .unwrap_or_else(|e| panic!("bearer pattern does not compile: {e}"))
});

static JWT_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap_or_else(|e| panic!("jwt pattern does not compile: {e}"))
});

/// Why an authorization claim was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthViolation {
    RoleMismatch { actual: String, required: Vec<String> },
    MalformedToken { reason: String },
}

impl AuthViolation {
    pub fn description(&self) -> String {
        match self {
            AuthViolation::RoleMismatch { actual, required } => {
                format!("role '{actual}' is not one of [{}]", required.join(", "))
            }
            AuthViolation::MalformedToken { reason } => format!("malformed token: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityAuthValidation {
    pub is_authorized: bool,
    pub violations: Vec<AuthViolation>,
}

/// Check that `actual_role` is one of `required_roles` and that `token` is a
/// well-formed bearer token. Both failures are reported when both apply.
///
/// An empty role set, or a blank role inside it, is a caller error.
pub fn validate_authentication(
    actual_role: &str,
    required_roles: &BTreeSet<String>,
    token: &str,
) -> Result<SecurityAuthValidation, EngineError> {
    if required_roles.is_empty() {
        return Err(EngineError::argument("required_roles must not be empty"));
    }
    if required_roles.iter().any(|role| role.trim().is_empty()) {
        return Err(EngineError::argument("required_roles must not contain a blank role"));
    }

    let mut violations = Vec::new();

    let actual = actual_role.trim();
    if !required_roles.iter().any(|role| role.trim() == actual) {
        violations.push(AuthViolation::RoleMismatch {
            actual: actual.to_string(),
            required: required_roles.iter().cloned().collect(),
        });
    }

    if let Err(reason) = check_token_shape(token) {
        violations.push(AuthViolation::MalformedToken { reason });
    }

    if !violations.is_empty() {
        tracing::debug!(role = actual, violations = violations.len(), "Authorization rejected");
    }

    Ok(SecurityAuthValidation {
        is_authorized: violations.is_empty(),
        violations,
    })
}

fn check_token_shape(token: &str) -> Result<(), String> {
    if token.trim().is_empty() {
        return Err("token is empty".to_string());
    }
    let credential = BEARER
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| "expected 'Bearer <credential>'".to_string())?;

    if credential.contains('.') {
        let segments: Vec<&str> = credential.split('.').collect();
        if segments.len() != 3 || !segments.iter().all(|s| JWT_SEGMENT.is_match(s)) {
            return Err("dotted credential is not a three-segment JWT".to_string());
        }
    }
    Ok(())
}
