//! Security categories, OWASP mapping and findings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Vulnerability class a test declares it checks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityType {
    SqlInjection,
    Xss,
    Csrf,
    CommandInjection,
    PathTraversal,
    LdapInjection,
    Xxe,
    Ssrf,
    SensitiveDataExposure,
    BrokenAccessControl,
    BrokenAuthentication,
}

impl SecurityType {
    pub const ALL: [SecurityType; 11] = [
        SecurityType::SqlInjection,
        SecurityType::Xss,
        SecurityType::Csrf,
        SecurityType::CommandInjection,
        SecurityType::PathTraversal,
        SecurityType::LdapInjection,
        SecurityType::Xxe,
        SecurityType::Ssrf,
        SecurityType::SensitiveDataExposure,
        SecurityType::BrokenAccessControl,
        SecurityType::BrokenAuthentication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityType::SqlInjection => "sql_injection",
            SecurityType::Xss => "xss",
            SecurityType::Csrf => "csrf",
            SecurityType::CommandInjection => "command_injection",
            SecurityType::PathTraversal => "path_traversal",
            SecurityType::LdapInjection => "ldap_injection",
            SecurityType::Xxe => "xxe",
            SecurityType::Ssrf => "ssrf",
            SecurityType::SensitiveDataExposure => "sensitive_data_exposure",
            SecurityType::BrokenAccessControl => "broken_access_control",
            SecurityType::BrokenAuthentication => "broken_authentication",
        }
    }

    /// Types whose payloads are injected into an interpreter (SQL, HTML/JS,
    /// shell, LDAP filter, XML parser).
    pub fn is_injection(&self) -> bool {
        matches!(
            self,
            SecurityType::SqlInjection
                | SecurityType::Xss
                | SecurityType::CommandInjection
                | SecurityType::LdapInjection
                | SecurityType::Xxe
        )
    }

    /// OWASP Top 10 (2021) category this type is reported under.
    pub fn owasp(&self) -> OwaspCategory {
        match self {
            SecurityType::SqlInjection
            | SecurityType::Xss
            | SecurityType::CommandInjection
            | SecurityType::LdapInjection => OwaspCategory::A03Injection,
            SecurityType::Csrf | SecurityType::PathTraversal | SecurityType::BrokenAccessControl => {
                OwaspCategory::A01BrokenAccessControl
            }
            SecurityType::Xxe => OwaspCategory::A05SecurityMisconfiguration,
            SecurityType::Ssrf => OwaspCategory::A10ServerSideRequestForgery,
            SecurityType::SensitiveDataExposure => OwaspCategory::A02CryptographicFailures,
            SecurityType::BrokenAuthentication => OwaspCategory::A07IdentificationAuthenticationFailures,
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let alias = match normalized.as_str() {
            "sql" | "sqli" => "sql_injection",
            "cross_site_scripting" => "xss",
            "command" | "os_command_injection" => "command_injection",
            "ldap" => "ldap_injection",
            other => other,
        };
        SecurityType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == alias)
            .ok_or_else(|| EngineError::argument(format!("unknown security type '{s}'")))
    }
}

/// OWASP Top 10 (2021).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OwaspCategory {
    #[serde(rename = "A01")]
    A01BrokenAccessControl,
    #[serde(rename = "A02")]
    A02CryptographicFailures,
    #[serde(rename = "A03")]
    A03Injection,
    #[serde(rename = "A04")]
    A04InsecureDesign,
    #[serde(rename = "A05")]
    A05SecurityMisconfiguration,
    #[serde(rename = "A06")]
    A06VulnerableComponents,
    #[serde(rename = "A07")]
    A07IdentificationAuthenticationFailures,
    #[serde(rename = "A08")]
    A08SoftwareDataIntegrityFailures,
    #[serde(rename = "A09")]
    A09LoggingMonitoringFailures,
    #[serde(rename = "A10")]
    A10ServerSideRequestForgery,
}

impl OwaspCategory {
    pub const ALL: [OwaspCategory; 10] = [
        OwaspCategory::A01BrokenAccessControl,
        OwaspCategory::A02CryptographicFailures,
        OwaspCategory::A03Injection,
        OwaspCategory::A04InsecureDesign,
        OwaspCategory::A05SecurityMisconfiguration,
        OwaspCategory::A06VulnerableComponents,
        OwaspCategory::A07IdentificationAuthenticationFailures,
        OwaspCategory::A08SoftwareDataIntegrityFailures,
        OwaspCategory::A09LoggingMonitoringFailures,
        OwaspCategory::A10ServerSideRequestForgery,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            OwaspCategory::A01BrokenAccessControl => "A01",
            OwaspCategory::A02CryptographicFailures => "A02",
            OwaspCategory::A03Injection => "A03",
            OwaspCategory::A04InsecureDesign => "A04",
            OwaspCategory::A05SecurityMisconfiguration => "A05",
            OwaspCategory::A06VulnerableComponents => "A06",
            OwaspCategory::A07IdentificationAuthenticationFailures => "A07",
            OwaspCategory::A08SoftwareDataIntegrityFailures => "A08",
            OwaspCategory::A09LoggingMonitoringFailures => "A09",
            OwaspCategory::A10ServerSideRequestForgery => "A10",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            OwaspCategory::A01BrokenAccessControl => "Broken Access Control",
            OwaspCategory::A02CryptographicFailures => "Cryptographic Failures",
            OwaspCategory::A03Injection => "Injection",
            OwaspCategory::A04InsecureDesign => "Insecure Design",
            OwaspCategory::A05SecurityMisconfiguration => "Security Misconfiguration",
            OwaspCategory::A06VulnerableComponents => "Vulnerable and Outdated Components",
            OwaspCategory::A07IdentificationAuthenticationFailures => {
                "Identification and Authentication Failures"
            }
            OwaspCategory::A08SoftwareDataIntegrityFailures => "Software and Data Integrity Failures",
            OwaspCategory::A09LoggingMonitoringFailures => "Security Logging and Monitoring Failures",
            OwaspCategory::A10ServerSideRequestForgery => "Server-Side Request Forgery",
        }
    }
}

impl fmt::Display for OwaspCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:2021 {}", self.code(), self.title())
    }
}

impl FromStr for OwaspCategory {
    type Err = EngineError;

    /// Accepts `A03`, `a03` or `A03:2021`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().split(':').next().unwrap_or_default().to_ascii_uppercase();
        OwaspCategory::ALL
            .iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or_else(|| EngineError::argument(format!("unknown OWASP category '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One matched vulnerability signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityFinding {
    pub category: SecurityType,
    pub owasp: OwaspCategory,
    /// Name of the signature rule that matched.
    pub rule: &'static str,
    /// The matched substring.
    pub matched_pattern: String,
    pub severity: Severity,
}
