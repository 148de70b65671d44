//! Recorded samples and the per-operation append log.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::operation::TestOperationId;

/// One timing observation. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSample {
    pub operation_id: TestOperationId,
    /// Milliseconds since the Unix epoch.
    pub recorded_at: u64,
    #[serde(with = "super::millis")]
    pub response_time: Duration,
    /// The caller reported a negative response time that was clamped to zero.
    pub clamped: bool,
}

/// Point-in-time copy of a log, taken under the lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogSnapshot {
    pub samples: Vec<PerformanceSample>,
    pub first_recorded: Option<Instant>,
    pub last_recorded: Option<Instant>,
    pub peak_cpu: Option<f64>,
    pub peak_memory: Option<u64>,
}

impl LogSnapshot {
    /// Time between the first and the last recorded sample.
    pub fn recording_span(&self) -> Option<Duration> {
        match (self.first_recorded, self.last_recorded) {
            (Some(first), Some(last)) => Some(last.saturating_duration_since(first)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct LogState {
    samples: Vec<PerformanceSample>,
    first_recorded: Option<Instant>,
    last_recorded: Option<Instant>,
    peak_cpu: Option<f64>,
    peak_memory: Option<u64>,
}

/// Append-only sample log for a single operation.
#[derive(Debug, Default)]
pub(crate) struct SampleLog {
    state: Mutex<LogState>,
}

impl SampleLog {
    // A panicking writer cannot leave a half-written sample behind, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, operation_id: &TestOperationId, response_time: Duration, clamped: bool) {
        let recorded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let sample = PerformanceSample {
            operation_id: operation_id.clone(),
            recorded_at,
            response_time,
            clamped,
        };

        let mut state = self.lock();
        let now = Instant::now();
        state.first_recorded.get_or_insert(now);
        state.last_recorded = Some(now);
        state.samples.push(sample);
    }

    pub fn record_resources(&self, cpu_percent: Option<f64>, memory_bytes: Option<u64>) {
        let mut state = self.lock();
        if let Some(cpu) = cpu_percent {
            state.peak_cpu = Some(state.peak_cpu.map_or(cpu, |peak| peak.max(cpu)));
        }
        if let Some(memory) = memory_bytes {
            state.peak_memory = Some(state.peak_memory.map_or(memory, |peak| peak.max(memory)));
        }
    }

    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn snapshot(&self) -> LogSnapshot {
        let state = self.lock();
        LogSnapshot {
            samples: state.samples.clone(),
            first_recorded: state.first_recorded,
            last_recorded: state.last_recorded,
            peak_cpu: state.peak_cpu,
            peak_memory: state.peak_memory,
        }
    }

    pub fn clear(&self) {
        *self.lock() = LogState::default();
    }
}
