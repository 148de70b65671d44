//! Test operation identity and resolved metadata.
//!
//! The runner resolves annotations into an [`OperationMetadata`] value and
//! hands it to the engine; nothing in the engine inspects annotations itself.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::performance::PerformanceThresholds;
use crate::resilience::RetryPolicy;
use crate::security::{OwaspCategory, SecurityType};

/// Stable identifier of a test method (qualified name, e.g. `LoginTests.validLogin`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestOperationId(String);

impl TestOperationId {
    /// Create an identifier. Blank names are rejected.
    pub fn new(name: impl Into<String>) -> Result<Self, EngineError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EngineError::argument("test operation id must not be blank"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestOperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TestOperationId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TestOperationId {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TestOperationId> for String {
    fn from(id: TestOperationId) -> Self {
        id.0
    }
}

/// Category a test belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Smoke,
    #[default]
    Regression,
    Integration,
    Api,
    Ui,
    Performance,
    Security,
    E2e,
}

/// Execution priority. Ordered from most to least important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

/// Declared security requirements of an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityRequirements {
    pub types: BTreeSet<SecurityType>,
    pub owasp: BTreeSet<OwaspCategory>,
    pub required_roles: BTreeSet<String>,
}

impl SecurityRequirements {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.owasp.is_empty() && self.required_roles.is_empty()
    }

    /// Security types to check: the declared ones plus every type mapped to a
    /// declared OWASP category.
    pub fn effective_types(&self) -> BTreeSet<SecurityType> {
        let mut types = self.types.clone();
        for category in &self.owasp {
            types.extend(SecurityType::ALL.iter().copied().filter(|t| t.owasp() == *category));
        }
        types
    }
}

/// Everything the runner resolved for one test operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationMetadata {
    pub id: TestOperationId,
    pub category: TestCategory,
    pub priority: Priority,
    pub description: Option<String>,
    /// Zero or one retry policy.
    pub retry: Option<RetryPolicy>,
    /// Zero or one performance threshold set.
    pub performance: Option<PerformanceThresholds>,
    pub security: SecurityRequirements,
}

impl OperationMetadata {
    pub fn new(id: TestOperationId) -> Self {
        Self {
            id,
            category: TestCategory::default(),
            priority: Priority::default(),
            description: None,
            retry: None,
            performance: None,
            security: SecurityRequirements::default(),
        }
    }
}
