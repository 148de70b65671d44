//! Input and response validation against the signature tables.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::SecurityConfig;
use crate::error::EngineError;
use crate::observability::metrics;
use crate::security::auth::{self, SecurityAuthValidation};
use crate::security::normalize::{normalize, DEFAULT_DECODE_ROUNDS};
use crate::security::signatures::{
    form_without_csrf_token, input_signatures, internal_url, reflected_payload_signatures,
    response_signatures, Signature,
};
use crate::security::types::{SecurityFinding, SecurityType, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityInputValidation {
    pub is_valid: bool,
    pub findings: Vec<SecurityFinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityResponseValidation {
    pub is_secure: bool,
    pub findings: Vec<SecurityFinding>,
}

/// Stateless validator. Holds only its decoding settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityValidator {
    max_decode_rounds: usize,
}

impl Default for SecurityValidator {
    fn default() -> Self {
        Self {
            max_decode_rounds: DEFAULT_DECODE_ROUNDS,
        }
    }
}

fn finding(category: SecurityType, rule: &'static str, matched: &str, severity: Severity) -> SecurityFinding {
    metrics::record_finding(category.as_str());
    tracing::debug!(category = %category, rule, severity = ?severity, "Security signature matched");
    SecurityFinding {
        category,
        owasp: category.owasp(),
        rule,
        matched_pattern: matched.to_string(),
        severity,
    }
}

fn signature_finding(category: SecurityType, signature: &Signature, matched: &str) -> SecurityFinding {
    finding(category, signature.name, matched, signature.severity)
}

impl SecurityValidator {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            max_decode_rounds: config.max_decode_rounds,
        }
    }

    pub fn max_decode_rounds(&self) -> usize {
        self.max_decode_rounds
    }

    /// Match `input` against the signature table of every requested type.
    ///
    /// The input is decoded first, so URL- and entity-encoded payloads are
    /// caught. At most one finding is reported per type: the first signature
    /// in table order that matches.
    pub fn validate_input(&self, input: &str, checked: &BTreeSet<SecurityType>) -> SecurityInputValidation {
        let mut findings = Vec::new();
        if !checked.is_empty() && !input.is_empty() {
            let normalized = normalize(input, self.max_decode_rounds);
            for &category in checked {
                if let Some(f) = Self::first_input_match(category, &normalized) {
                    findings.push(f);
                }
            }
        }

        SecurityInputValidation {
            is_valid: findings.is_empty(),
            findings,
        }
    }

    fn first_input_match(category: SecurityType, text: &str) -> Option<SecurityFinding> {
        let matched = input_signatures(category)
            .iter()
            .find_map(|sig| sig.find(text).map(|m| signature_finding(category, sig, m)));
        if matched.is_some() || category != SecurityType::Ssrf {
            return matched;
        }
        internal_url(text).map(|url| finding(category, "internal-url", url, Severity::High))
    }

    /// Scan a raw response body for leaked data and unsanitized payload echoes.
    ///
    /// An injection type reports its first echoed payload signature, then every
    /// disclosure rule that matches. The body is not decoded, so an escaped
    /// echo is secure.
    pub fn validate_response(&self, body: &str, declared: &BTreeSet<SecurityType>) -> SecurityResponseValidation {
        let mut findings = Vec::new();
        if !body.is_empty() {
            for &category in declared {
                let echoed = reflected_payload_signatures(category)
                    .iter()
                    .find_map(|sig| sig.find(body).map(|m| signature_finding(category, sig, m)));
                findings.extend(echoed);
                for sig in response_signatures(category) {
                    if let Some(m) = sig.find(body) {
                        findings.push(signature_finding(category, sig, m));
                    }
                }
                if category == SecurityType::Csrf {
                    if let Some(form) = form_without_csrf_token(body) {
                        findings.push(finding(category, "form-missing-csrf-token", form, Severity::Medium));
                    }
                }
            }
        }

        SecurityResponseValidation {
            is_secure: findings.is_empty(),
            findings,
        }
    }

    /// Report `payload` (the exact attack string that was sent) if it comes
    /// back verbatim in `body`.
    pub fn check_reflection(&self, body: &str, payload: &str, category: SecurityType) -> SecurityResponseValidation {
        let mut findings = Vec::new();
        if !payload.is_empty() && body.contains(payload) {
            findings.push(finding(category, "reflected-payload", payload, Severity::High));
        }
        SecurityResponseValidation {
            is_secure: findings.is_empty(),
            findings,
        }
    }

    pub fn validate_authentication(
        &self,
        actual_role: &str,
        required_roles: &BTreeSet<String>,
        token: &str,
    ) -> Result<SecurityAuthValidation, EngineError> {
        auth::validate_authentication(actual_role, required_roles, token)
    }
}
