//! Performance monitor reports, evaluation and concurrent recording.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use qa_engine::performance::{run_load, PerformanceMonitor, PerformanceThresholds, TestType, Violation};

mod common;
use common::op;

fn thresholds(max_response_ms: u64) -> PerformanceThresholds {
    PerformanceThresholds::builder()
        .max_response_time(Duration::from_millis(max_response_ms))
        .duration(Duration::from_secs(3600))
        .build()
        .unwrap()
}

#[test]
fn test_report_without_samples_is_no_data() {
    let monitor = PerformanceMonitor::new();
    let report = monitor.report(&op("Search.empty"));
    assert!(report.is_no_data());
    assert_eq!(report.count(), 0);
    assert!(report.summary().is_none());
}

#[test]
fn test_report_statistics() {
    let monitor = PerformanceMonitor::new();
    let id = op("Login.submit");
    for ms in [100, 200, 300] {
        monitor.record_request(&id, ms);
    }

    let report = monitor.report(&id);
    let summary = report.summary().unwrap();
    assert_eq!(summary.count, 3);
    assert_eq!(summary.mean, Duration::from_millis(200));
    assert_eq!(summary.min, Duration::from_millis(100));
    assert_eq!(summary.max, Duration::from_millis(300));
    assert_eq!(summary.p95, Duration::from_millis(300));
}

#[test]
fn test_evaluate_flags_each_slow_sample() {
    let monitor = PerformanceMonitor::new();
    let id = op("Login.submit");
    for ms in [100, 200, 300] {
        monitor.record_request(&id, ms);
    }

    let evaluation = monitor.evaluate(&id, &thresholds(250));
    assert!(!evaluation.passed);
    assert_eq!(evaluation.response_time_violation_count(), 1);
    assert_eq!(
        evaluation.violations,
        vec![Violation::ResponseTime {
            sample_index: 2,
            response_time: Duration::from_millis(300),
            limit: Duration::from_millis(250),
        }]
    );
    assert_eq!(
        evaluation.descriptions(),
        vec!["sample #2 took 300 ms, exceeding the 250 ms limit".to_string()]
    );
}

#[test]
fn test_evaluate_passes_within_limits() {
    let monitor = PerformanceMonitor::new();
    let id = op("Catalog.list");
    monitor.record_request(&id, 20);
    monitor.record_request(&id, 30);

    let evaluation = monitor.evaluate(&id, &thresholds(250));
    assert!(evaluation.passed);
    assert!(evaluation.violations.is_empty());
}

#[test]
fn test_evaluate_without_samples_fails() {
    let monitor = PerformanceMonitor::new();
    let evaluation = monitor.evaluate(&op("Never.ran"), &thresholds(250));
    assert!(!evaluation.passed);
    assert_eq!(evaluation.violations, vec![Violation::NoSamples]);
}

#[test]
fn test_throughput_checked_after_duration() {
    let monitor = PerformanceMonitor::new();
    let id = op("Api.bulkImport");
    monitor.record_request(&id, 5);
    monitor.record_request(&id, 5);
    thread::sleep(Duration::from_millis(50));

    let strict = PerformanceThresholds::builder()
        .max_response_time(Duration::from_millis(100))
        .duration(Duration::from_millis(10))
        .expected_throughput(1_000_000.0)
        .build()
        .unwrap();
    let evaluation = monitor.evaluate(&id, &strict);
    assert!(matches!(evaluation.violations.as_slice(), [Violation::Throughput { .. }]));

    // Declared duration not yet elapsed: throughput is not judged
    let long_run = PerformanceThresholds::builder()
        .max_response_time(Duration::from_millis(100))
        .duration(Duration::from_secs(3600))
        .expected_throughput(1_000_000.0)
        .build()
        .unwrap();
    assert!(monitor.evaluate(&id, &long_run).passed);
}

#[test]
fn test_finished_run_evaluates_the_same_later() {
    let monitor = PerformanceMonitor::new();
    let id = op("Api.search");
    for _ in 0..50 {
        monitor.record_request(&id, 5);
    }
    thread::sleep(Duration::from_millis(30));

    let limits = PerformanceThresholds::builder()
        .max_response_time(Duration::from_millis(100))
        .duration(Duration::from_millis(20))
        .expected_throughput(100.0)
        .build()
        .unwrap();

    let first = monitor.evaluate(&id, &limits);
    assert!(first.passed, "{:?}", first.descriptions());

    // No new samples: the report and the verdict must not drift
    thread::sleep(Duration::from_millis(200));
    let second = monitor.evaluate(&id, &limits);
    assert_eq!(first, second);
    assert_eq!(monitor.report(&id), second.report);
}

#[test]
fn test_resource_peaks_are_evaluated() {
    let monitor = PerformanceMonitor::new();
    let id = op("Report.render");
    monitor.record_request(&id, 10);
    monitor.record_resource_usage(&id, Some(40.0), Some(1_000));
    monitor.record_resource_usage(&id, Some(95.0), Some(500));

    let limits = PerformanceThresholds::builder()
        .max_response_time(Duration::from_millis(100))
        .duration(Duration::from_secs(3600))
        .max_cpu_usage(80.0)
        .max_memory_usage(800)
        .build()
        .unwrap();
    let evaluation = monitor.evaluate(&id, &limits);
    assert_eq!(
        evaluation.violations,
        vec![
            Violation::CpuUsage { observed: 95.0, limit: 80.0 },
            Violation::MemoryUsage { observed: 1_000, limit: 800 },
        ]
    );
}

#[test]
fn test_concurrent_recording_loses_nothing() {
    let monitor = Arc::new(PerformanceMonitor::new());
    let id = op("Cart.checkout");
    let threads = 16;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let monitor = monitor.clone();
            let id = id.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    monitor.record_request(&id, (t * 100 + i) as i64);
                }
            })
        })
        .collect();

    // Readers racing the writers see consistent snapshots
    for _ in 0..10 {
        let count = monitor.report(&id).count();
        assert!(count <= threads * 100);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(monitor.sample_count(&id), threads * 100);
    assert_eq!(monitor.report(&id).count(), threads * 100);
}

#[test]
fn test_reset_between_runs() {
    let monitor = PerformanceMonitor::new();
    let id = op("Login.submit");
    monitor.record_request(&id, 900);
    monitor.reset(&id);
    monitor.record_request(&id, 100);

    let evaluation = monitor.evaluate(&id, &thresholds(250));
    assert!(evaluation.passed);
}

#[test]
fn test_load_run_feeds_evaluation() {
    let monitor = PerformanceMonitor::new();
    let id = op("Api.health");
    let limits = PerformanceThresholds::builder()
        .max_response_time(Duration::from_secs(1))
        .concurrent_users(3)
        .duration(Duration::from_millis(20))
        .test_type(TestType::Stress)
        .build()
        .unwrap();

    let summary = run_load(&monitor, &id, &limits, |_| -> Result<(), ()> {
        thread::sleep(Duration::from_millis(2));
        Ok(())
    });

    assert_eq!(summary.failures, 0);
    assert_eq!(monitor.report(&id).count() as u64, summary.calls);
    assert!(monitor.evaluate(&id, &limits).passed);
}

#[test]
fn test_evaluation_serializes_for_reporting() {
    let monitor = PerformanceMonitor::new();
    let id = op("Login.submit");
    monitor.record_request(&id, 300);

    let json = serde_json::to_value(monitor.evaluate(&id, &thresholds(250))).unwrap();
    assert_eq!(json["operation_id"], "Login.submit");
    assert_eq!(json["passed"], false);
    assert_eq!(json["violations"][0]["kind"], "response_time");
    assert_eq!(json["violations"][0]["response_time"], 300.0);
    assert_eq!(json["report"]["status"], "measured");
}
