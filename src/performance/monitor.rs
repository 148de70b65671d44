//! Per-operation performance sample registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;
use crate::operation::TestOperationId;
use crate::performance::evaluate::Evaluation;
use crate::performance::report::PerformanceReport;
use crate::performance::sample::{PerformanceSample, SampleLog};
use crate::performance::thresholds::PerformanceThresholds;

/// Thread-safe registry of sample logs keyed by test operation.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct PerformanceMonitor {
    logs: Arc<DashMap<TestOperationId, Arc<SampleLog>>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self, id: &TestOperationId) -> Arc<SampleLog> {
        if let Some(log) = self.logs.get(id) {
            return log.value().clone();
        }
        self.logs.entry(id.clone()).or_default().value().clone()
    }

    fn existing(&self, id: &TestOperationId) -> Option<Arc<SampleLog>> {
        self.logs.get(id).map(|log| log.value().clone())
    }

    /// Record one request's response time in milliseconds.
    ///
    /// Never fails. Negative values are clamped to zero and the sample is
    /// flagged so the report can surface the data-quality problem.
    pub fn record_request(&self, id: &TestOperationId, response_time_ms: i64) {
        let clamped = response_time_ms < 0;
        if clamped {
            tracing::warn!(operation = %id, response_time_ms, "Negative response time clamped to zero");
        }
        let response_time = Duration::from_millis(response_time_ms.max(0) as u64);
        self.append(id, response_time, clamped);
    }

    /// Record an already measured response time.
    pub fn record_duration(&self, id: &TestOperationId, response_time: Duration) {
        self.append(id, response_time, false);
    }

    /// Run `f`, recording how long it took.
    pub fn time<T>(&self, id: &TestOperationId, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        self.record_duration(id, start.elapsed());
        value
    }

    /// Record observed resource usage; the evaluation compares the peaks.
    pub fn record_resource_usage(
        &self,
        id: &TestOperationId,
        cpu_percent: Option<f64>,
        memory_bytes: Option<u64>,
    ) {
        let cpu_percent = cpu_percent.filter(|cpu| cpu.is_finite());
        self.log(id).record_resources(cpu_percent, memory_bytes);
    }

    fn append(&self, id: &TestOperationId, response_time: Duration, clamped: bool) {
        self.log(id).append(id, response_time, clamped);
        metrics::record_sample(id.as_str(), response_time);
    }

    /// Aggregate statistics over the samples recorded so far.
    pub fn report(&self, id: &TestOperationId) -> PerformanceReport {
        match self.existing(id) {
            Some(log) => PerformanceReport::from_snapshot(&log.snapshot()),
            None => PerformanceReport::NoData,
        }
    }

    /// Compare the recorded samples against `thresholds`.
    pub fn evaluate(&self, id: &TestOperationId, thresholds: &PerformanceThresholds) -> Evaluation {
        let snapshot = self.existing(id).map(|log| log.snapshot()).unwrap_or_default();
        let evaluation = Evaluation::from_snapshot(id, &snapshot, thresholds);
        metrics::record_evaluation(evaluation.passed);
        if !evaluation.passed {
            tracing::info!(
                operation = %id,
                violations = evaluation.violations.len(),
                "Performance thresholds violated"
            );
        }
        evaluation
    }

    /// Copy of the samples recorded for `id`, in recording order.
    pub fn samples(&self, id: &TestOperationId) -> Vec<PerformanceSample> {
        self.existing(id).map(|log| log.snapshot().samples).unwrap_or_default()
    }

    pub fn sample_count(&self, id: &TestOperationId) -> usize {
        self.existing(id).map_or(0, |log| log.len())
    }

    /// Operations with a log in the registry.
    pub fn operations(&self) -> Vec<TestOperationId> {
        let mut ids: Vec<_> = self.logs.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Clear the log of one operation before an independent run.
    pub fn reset(&self, id: &TestOperationId) {
        if let Some(log) = self.existing(id) {
            log.clear();
            tracing::debug!(operation = %id, "Performance samples reset");
        }
    }

    pub fn reset_all(&self) {
        for entry in self.logs.iter() {
            entry.value().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str) -> TestOperationId {
        TestOperationId::new(name).unwrap()
    }

    #[test]
    fn test_negative_response_time_is_clamped_and_flagged() {
        let monitor = PerformanceMonitor::new();
        let id = op("Checkout.pay");
        monitor.record_request(&id, -15);
        monitor.record_request(&id, 40);

        let samples = monitor.samples(&id);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].response_time, Duration::ZERO);
        assert!(samples[0].clamped);
        assert!(!samples[1].clamped);

        let summary = monitor.report(&id).summary().cloned().unwrap();
        assert_eq!(summary.clamped_samples, 1);
    }

    #[test]
    fn test_reset_is_scoped_to_one_operation() {
        let monitor = PerformanceMonitor::new();
        let a = op("A.one");
        let b = op("B.two");
        monitor.record_request(&a, 10);
        monitor.record_request(&b, 20);

        monitor.reset(&a);
        assert!(monitor.report(&a).is_no_data());
        assert_eq!(monitor.sample_count(&b), 1);

        monitor.reset_all();
        assert_eq!(monitor.sample_count(&b), 0);
    }

    #[test]
    fn test_clones_share_registry() {
        let monitor = PerformanceMonitor::new();
        let handle = monitor.clone();
        let id = op("Search.query");
        handle.record_request(&id, 5);
        assert_eq!(monitor.sample_count(&id), 1);
        assert_eq!(monitor.operations(), vec![id]);
    }

    #[test]
    fn test_time_records_one_sample() {
        let monitor = PerformanceMonitor::new();
        let id = op("Cart.add");
        let value = monitor.time(&id, || 7);
        assert_eq!(value, 7);
        assert_eq!(monitor.sample_count(&id), 1);
    }
}
