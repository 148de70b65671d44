//! Threshold evaluation.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::operation::TestOperationId;
use crate::performance::report::PerformanceReport;
use crate::performance::sample::LogSnapshot;
use crate::performance::thresholds::PerformanceThresholds;

/// A single threshold breach.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Nothing was recorded, so nothing can pass.
    NoSamples,
    /// One sample exceeded `max_response_time`. `sample_index` is its
    /// position in recording order.
    ResponseTime {
        sample_index: usize,
        #[serde(with = "super::millis")]
        response_time: Duration,
        #[serde(with = "super::millis")]
        limit: Duration,
    },
    Throughput { observed: f64, expected: f64 },
    CpuUsage { observed: f64, limit: f64 },
    MemoryUsage { observed: u64, limit: u64 },
}

impl Violation {
    pub fn description(&self) -> String {
        match self {
            Violation::NoSamples => "no performance samples recorded".to_string(),
            Violation::ResponseTime { sample_index, response_time, limit } => format!(
                "sample #{sample_index} took {} ms, exceeding the {} ms limit",
                response_time.as_millis(),
                limit.as_millis()
            ),
            Violation::Throughput { observed, expected } => format!(
                "throughput {observed:.2} req/s is below the expected {expected:.2} req/s"
            ),
            Violation::CpuUsage { observed, limit } => {
                format!("peak CPU usage {observed:.1}% exceeds the {limit:.1}% limit")
            }
            Violation::MemoryUsage { observed, limit } => {
                format!("peak memory usage {observed} bytes exceeds the {limit} byte limit")
            }
        }
    }
}

/// Requests per second over the recorded span, or over the declared window
/// when the samples span less than it. Depends only on the sample set.
fn windowed_throughput(snapshot: &LogSnapshot, declared: Duration) -> Option<f64> {
    let window = snapshot.recording_span()?.max(declared);
    if window.is_zero() {
        return None;
    }
    Some(snapshot.samples.len() as f64 / window.as_secs_f64())
}

/// Outcome of comparing an operation's samples against its thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub operation_id: TestOperationId,
    pub passed: bool,
    pub violations: Vec<Violation>,
    pub report: PerformanceReport,
}

impl Evaluation {
    pub(crate) fn from_snapshot(
        id: &TestOperationId,
        snapshot: &LogSnapshot,
        thresholds: &PerformanceThresholds,
    ) -> Self {
        let report = PerformanceReport::from_snapshot(snapshot);
        let mut violations = Vec::new();

        if report.is_no_data() {
            return Self {
                operation_id: id.clone(),
                passed: false,
                violations: vec![Violation::NoSamples],
                report,
            };
        }

        let limit = thresholds.max_response_time();
        for (sample_index, sample) in snapshot.samples.iter().enumerate() {
            if sample.response_time > limit {
                violations.push(Violation::ResponseTime {
                    sample_index,
                    response_time: sample.response_time,
                    limit,
                });
            }
        }

        let duration_elapsed = snapshot
            .first_recorded
            .is_some_and(|first| Instant::now().duration_since(first) >= thresholds.duration());
        let expected = thresholds.expected_throughput();
        if duration_elapsed && expected > 0.0 {
            if let Some(observed) = windowed_throughput(snapshot, thresholds.duration()) {
                if observed < expected {
                    violations.push(Violation::Throughput { observed, expected });
                }
            }
        }

        if let Some(cpu) = snapshot.peak_cpu {
            if cpu > thresholds.max_cpu_usage() {
                violations.push(Violation::CpuUsage {
                    observed: cpu,
                    limit: thresholds.max_cpu_usage(),
                });
            }
        }
        if let Some(memory) = snapshot.peak_memory {
            if memory > thresholds.max_memory_usage() {
                violations.push(Violation::MemoryUsage {
                    observed: memory,
                    limit: thresholds.max_memory_usage(),
                });
            }
        }

        Self {
            operation_id: id.clone(),
            passed: violations.is_empty(),
            violations,
            report,
        }
    }

    /// Number of individual samples over the response-time limit.
    pub fn response_time_violation_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::ResponseTime { .. }))
            .count()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.violations.iter().map(Violation::description).collect()
    }
}
