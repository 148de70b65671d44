//! Suite configuration parsing, validation and resolution.

use std::fs;
use std::time::Duration;

use qa_engine::config::{load_config, parse_config, ConfigError};
use qa_engine::performance::TestType;
use qa_engine::security::{OwaspCategory, SecurityType};
use qa_engine::{ErrorKind, Priority, TestCategory};

const SUITE: &str = r#"
[observability]
log_level = "debug"

[retry]
max_attempts = 2
initial_delay_ms = 250

[security]
max_decode_rounds = 4

[[operations]]
id = "LoginTests.validCredentials"
category = "smoke"
priority = "critical"
description = "User can sign in"

[operations.retry]
max_attempts = 5
retry_on = ["timeout", "stale_element"]
never_retry_on = ["assertion"]

[operations.performance]
max_response_time_ms = 800
concurrent_users = 10
duration_ms = 60000
expected_throughput = 25.0
test_type = "spike"

[operations.security]
owasp = ["A07"]
required_roles = ["ADMIN", " OPS "]

[[operations]]
id = "SearchTests.query"
category = "api"

[operations.security]
types = ["xss", "sql_injection"]
"#;

#[test]
fn test_parse_suite() {
    let config = parse_config(SUITE).unwrap();
    assert_eq!(config.observability.log_level, "debug");
    assert_eq!(config.security.max_decode_rounds, 4);
    assert_eq!(config.operations.len(), 2);

    let policy = config.default_retry_policy().unwrap();
    assert_eq!(policy.max_attempts(), 2);
    assert_eq!(policy.initial_delay(), Duration::from_millis(250));
    assert_eq!(policy.max_delay(), Duration::from_secs(30));
}

#[test]
fn test_resolve_operations() {
    let config = parse_config(SUITE).unwrap();
    let operations = config.resolve_operations().unwrap();

    let login = &operations[0];
    assert_eq!(login.id.as_str(), "LoginTests.validCredentials");
    assert_eq!(login.category, TestCategory::Smoke);
    assert_eq!(login.priority, Priority::Critical);

    let retry = login.retry.as_ref().unwrap();
    assert_eq!(retry.max_attempts(), 5);
    // Operation tables start from defaults, not from the suite-level [retry]
    assert_eq!(retry.initial_delay(), Duration::from_secs(1));
    assert!(retry.is_retryable(&ErrorKind::Timeout));
    assert!(!retry.is_retryable(&ErrorKind::Connection));
    assert!(!retry.is_retryable(&ErrorKind::Assertion));

    let thresholds = login.performance.as_ref().unwrap();
    assert_eq!(thresholds.max_response_time(), Duration::from_millis(800));
    assert_eq!(thresholds.concurrent_users(), 10);
    assert_eq!(thresholds.test_type(), TestType::Spike);
    assert_eq!(thresholds.max_cpu_usage(), 80.0);

    assert!(login.security.owasp.contains(&OwaspCategory::A07IdentificationAuthenticationFailures));
    assert!(login
        .security
        .effective_types()
        .contains(&SecurityType::BrokenAuthentication));
    assert!(login.security.required_roles.contains("OPS"));

    let search = &operations[1];
    assert_eq!(search.category, TestCategory::Api);
    assert_eq!(search.priority, Priority::Medium);
    assert!(search.retry.is_none());
    assert!(search.performance.is_none());
    assert_eq!(search.security.effective_types().len(), 2);
}

#[test]
fn test_minimal_suite_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.observability.log_level, "info");
    assert!(config.operations.is_empty());
    assert_eq!(config.default_retry_policy().unwrap().max_attempts(), 3);
}

#[test]
fn test_semantic_errors_are_collected() {
    let suite = r#"
[retry]
max_attempts = 0

[[operations]]
id = "A.b"

[operations.performance]
max_cpu_usage = 150.0

[[operations]]
id = "A.b"
"#;
    match parse_config(suite) {
        Err(ConfigError::Validation(errors)) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["retry", "operations[0].performance", "operations[1].id"]);
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn test_config_error_messages() {
    let err = parse_config("[security]\nmax_decode_rounds = 0").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("invalid suite configuration: "), "{message}");
    assert!(message.contains("security.max_decode_rounds"), "{message}");
    assert!(std::error::Error::source(&err).is_none());

    let err = parse_config("[retry").unwrap_err();
    assert!(err.to_string().starts_with("malformed suite file: "));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_syntax_errors_are_parse_errors() {
    assert!(matches!(parse_config("[retry"), Err(ConfigError::Parse(_))));
    assert!(matches!(
        parse_config("[retry]\nmax_attempts = \"three\""),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        parse_config("[[operations]]\nid = \"A.b\"\n[operations.security]\ntypes = [\"telepathy\"]"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_load_from_disk() {
    let path = std::env::temp_dir().join(format!("qa-engine-suite-{}.toml", std::process::id()));
    fs::write(&path, SUITE).unwrap();
    let loaded = load_config(&path);
    fs::remove_file(&path).unwrap();

    assert_eq!(loaded.unwrap().operations.len(), 2);

    let missing = load_config(&path);
    assert!(matches!(missing, Err(ConfigError::Io(_))));
}
