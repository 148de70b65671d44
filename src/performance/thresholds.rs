//! Declared performance thresholds of a test operation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Kind of performance test the thresholds were declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    #[default]
    Load,
    Stress,
    Spike,
    Volume,
    Endurance,
}

/// Immutable snapshot of the declared performance intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceThresholds {
    #[serde(with = "super::millis")]
    max_response_time: Duration,
    concurrent_users: u32,
    #[serde(with = "super::millis")]
    duration: Duration,
    max_cpu_usage: f64,
    max_memory_usage: u64,
    expected_throughput: f64,
    test_type: TestType,
}

impl PerformanceThresholds {
    pub fn builder() -> PerformanceThresholdsBuilder {
        PerformanceThresholdsBuilder::default()
    }

    pub fn max_response_time(&self) -> Duration {
        self.max_response_time
    }

    pub fn concurrent_users(&self) -> u32 {
        self.concurrent_users
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Percentage in `[0, 100]`.
    pub fn max_cpu_usage(&self) -> f64 {
        self.max_cpu_usage
    }

    /// Bytes.
    pub fn max_memory_usage(&self) -> u64 {
        self.max_memory_usage
    }

    /// Requests per second.
    pub fn expected_throughput(&self) -> f64 {
        self.expected_throughput
    }

    pub fn test_type(&self) -> TestType {
        self.test_type
    }
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            max_response_time: Duration::from_millis(5000),
            concurrent_users: 1,
            duration: Duration::from_secs(60),
            max_cpu_usage: 80.0,
            max_memory_usage: 1024 * 1024 * 1024,
            expected_throughput: 0.0,
            test_type: TestType::Load,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceThresholdsBuilder {
    thresholds: PerformanceThresholds,
}

impl PerformanceThresholdsBuilder {
    pub fn max_response_time(mut self, value: Duration) -> Self {
        self.thresholds.max_response_time = value;
        self
    }

    pub fn concurrent_users(mut self, users: u32) -> Self {
        self.thresholds.concurrent_users = users;
        self
    }

    pub fn duration(mut self, value: Duration) -> Self {
        self.thresholds.duration = value;
        self
    }

    pub fn max_cpu_usage(mut self, percent: f64) -> Self {
        self.thresholds.max_cpu_usage = percent;
        self
    }

    pub fn max_memory_usage(mut self, bytes: u64) -> Self {
        self.thresholds.max_memory_usage = bytes;
        self
    }

    pub fn expected_throughput(mut self, rps: f64) -> Self {
        self.thresholds.expected_throughput = rps;
        self
    }

    pub fn test_type(mut self, test_type: TestType) -> Self {
        self.thresholds.test_type = test_type;
        self
    }

    pub fn build(self) -> Result<PerformanceThresholds, EngineError> {
        let t = self.thresholds;
        if t.concurrent_users == 0 {
            return Err(EngineError::policy("concurrent_users must be at least 1"));
        }
        if !(0.0..=100.0).contains(&t.max_cpu_usage) {
            return Err(EngineError::policy(format!(
                "max_cpu_usage must be within [0, 100], got {}",
                t.max_cpu_usage
            )));
        }
        if !t.expected_throughput.is_finite() || t.expected_throughput < 0.0 {
            return Err(EngineError::policy(format!(
                "expected_throughput must be a non-negative number, got {}",
                t.expected_throughput
            )));
        }
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_validation() {
        assert!(PerformanceThresholds::builder().concurrent_users(0).build().is_err());
        assert!(PerformanceThresholds::builder().max_cpu_usage(120.0).build().is_err());
        assert!(PerformanceThresholds::builder().expected_throughput(-1.0).build().is_err());
        assert!(PerformanceThresholds::builder().expected_throughput(f64::INFINITY).build().is_err());

        let t = PerformanceThresholds::builder()
            .max_response_time(Duration::from_millis(250))
            .concurrent_users(10)
            .test_type(TestType::Spike)
            .build()
            .unwrap();
        assert_eq!(t.concurrent_users(), 10);
        assert_eq!(t.test_type(), TestType::Spike);
    }

    #[test]
    fn test_serializes_durations_as_millis() {
        let t = PerformanceThresholds::builder()
            .max_response_time(Duration::from_millis(250))
            .build()
            .unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["max_response_time"], 250.0);
        assert_eq!(json["test_type"], "load");
    }
}
