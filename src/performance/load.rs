//! Concurrent load driver.
//!
//! Spawns one worker thread per simulated user; each worker calls the
//! operation repeatedly until the declared duration elapses and records one
//! sample per call, failed calls included.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::operation::TestOperationId;
use crate::performance::monitor::PerformanceMonitor;
use crate::performance::thresholds::PerformanceThresholds;

/// Totals of a finished load run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadRunSummary {
    pub users: u32,
    pub calls: u64,
    pub failures: u64,
    #[serde(with = "super::millis")]
    pub wall_time: Duration,
}

/// Drive `op` with `thresholds.concurrent_users()` parallel users for
/// `thresholds.duration()`.
///
/// `op` receives the 0-based user index. Every user performs at least one call.
pub fn run_load<E, F>(
    monitor: &PerformanceMonitor,
    id: &TestOperationId,
    thresholds: &PerformanceThresholds,
    op: F,
) -> LoadRunSummary
where
    F: Fn(u32) -> Result<(), E> + Sync,
{
    let users = thresholds.concurrent_users();
    let duration = thresholds.duration();
    let calls = AtomicU64::new(0);
    let failures = AtomicU64::new(0);

    tracing::info!(
        operation = %id,
        users,
        duration_ms = duration.as_millis() as u64,
        test_type = ?thresholds.test_type(),
        "Starting load run"
    );

    let start = Instant::now();
    std::thread::scope(|scope| {
        for user in 0..users {
            let op = &op;
            let calls = &calls;
            let failures = &failures;
            scope.spawn(move || loop {
                let call_start = Instant::now();
                let outcome = op(user);
                monitor.record_duration(id, call_start.elapsed());
                calls.fetch_add(1, Ordering::Relaxed);
                if outcome.is_err() {
                    failures.fetch_add(1, Ordering::Relaxed);
                }
                if start.elapsed() >= duration {
                    break;
                }
            });
        }
    });

    let summary = LoadRunSummary {
        users,
        calls: calls.into_inner(),
        failures: failures.into_inner(),
        wall_time: start.elapsed(),
    };
    tracing::info!(operation = %id, calls = summary.calls, failures = summary.failures, "Load run finished");
    summary
}
