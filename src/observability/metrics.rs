//! Metrics collection.
//!
//! # Metrics
//! - `qa_retry_attempts_total` (counter): attempts started, labelled first/retry
//! - `qa_retry_exhausted_total` (counter): executions that ran out of attempts
//! - `qa_performance_samples_total` (counter): samples recorded, by operation
//! - `qa_performance_response_time_seconds` (histogram): recorded response times
//! - `qa_performance_evaluations_total` (counter): evaluations, by outcome
//! - `qa_security_findings_total` (counter): findings, by category

use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install a process-wide Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::debug!("Prometheus recorder installed");
    Ok(handle)
}

pub fn record_retry_attempt(attempt: u32) {
    let phase = if attempt == 1 { "first" } else { "retry" };
    counter!("qa_retry_attempts_total", "phase" => phase).increment(1);
}

pub fn record_retry_exhausted() {
    counter!("qa_retry_exhausted_total").increment(1);
}

pub fn record_sample(operation: &str, response_time: Duration) {
    counter!("qa_performance_samples_total", "operation" => operation.to_string()).increment(1);
    histogram!("qa_performance_response_time_seconds", "operation" => operation.to_string())
        .record(response_time.as_secs_f64());
}

pub fn record_evaluation(passed: bool) {
    let outcome = if passed { "passed" } else { "failed" };
    counter!("qa_performance_evaluations_total", "outcome" => outcome).increment(1);
}

pub fn record_finding(category: &'static str) {
    counter!("qa_security_findings_total", "category" => category).increment(1);
}
