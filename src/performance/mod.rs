//! Performance monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Test operation body (possibly N simulated users in parallel):
//!     → monitor.rs record_request (append one sample per attempt)
//!
//! After the run:
//!     → monitor.rs report (snapshot → report.rs statistics)
//!     → evaluate.rs (compare against thresholds.rs, ordered violations)
//!     → monitor.rs reset (before the next independent run)
//! ```
//!
//! # Design Decisions
//! - The registry is an explicit instance so tests can isolate their data
//! - Per-operation lock held only for a single append or snapshot
//! - Zero samples is a distinct report state, never a silent pass

pub mod evaluate;
pub mod load;
pub mod monitor;
pub mod report;
pub mod sample;
pub mod thresholds;

pub use evaluate::{Evaluation, Violation};
pub use load::{run_load, LoadRunSummary};
pub use monitor::PerformanceMonitor;
pub use report::{LatencySummary, PerformanceReport};
pub use sample::PerformanceSample;
pub use thresholds::{PerformanceThresholds, PerformanceThresholdsBuilder, TestType};

/// Serialize durations as fractional milliseconds for reporting sinks.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }
}
