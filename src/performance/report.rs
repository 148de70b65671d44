//! Aggregate statistics over recorded samples.

use std::time::Duration;

use serde::Serialize;

use crate::performance::sample::LogSnapshot;

/// Report computed on demand from the current sample set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PerformanceReport {
    /// No samples recorded; every derived statistic is undefined.
    NoData,
    Measured(LatencySummary),
}

impl PerformanceReport {
    pub(crate) fn from_snapshot(snapshot: &LogSnapshot) -> Self {
        let times: Vec<Duration> = snapshot.samples.iter().map(|s| s.response_time).collect();
        let elapsed = snapshot.recording_span();
        let clamped = snapshot.samples.iter().filter(|s| s.clamped).count();

        match LatencySummary::from_response_times(&times, elapsed) {
            Some(mut summary) => {
                summary.clamped_samples = clamped;
                PerformanceReport::Measured(summary)
            }
            None => PerformanceReport::NoData,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, PerformanceReport::NoData)
    }

    pub fn summary(&self) -> Option<&LatencySummary> {
        match self {
            PerformanceReport::Measured(summary) => Some(summary),
            PerformanceReport::NoData => None,
        }
    }

    pub fn count(&self) -> usize {
        self.summary().map_or(0, |s| s.count)
    }
}

/// Statistics of a non-empty sample set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    #[serde(with = "super::millis")]
    pub min: Duration,
    #[serde(with = "super::millis")]
    pub max: Duration,
    #[serde(with = "super::millis")]
    pub mean: Duration,
    /// Nearest-rank 95th percentile.
    #[serde(with = "super::millis")]
    pub p95: Duration,
    /// Requests per second between the first and last sample; `None` for a
    /// zero-length span.
    pub observed_throughput: Option<f64>,
    /// Samples whose negative input was clamped to zero.
    pub clamped_samples: usize,
}

impl LatencySummary {
    /// Summarise `times`. Returns `None` for an empty slice.
    pub fn from_response_times(times: &[Duration], elapsed: Option<Duration>) -> Option<Self> {
        if times.is_empty() {
            return None;
        }

        let mut sorted = times.to_vec();
        sorted.sort_unstable();
        let count = sorted.len();

        let total_ns: u128 = sorted.iter().map(Duration::as_nanos).sum();
        let mean_ns = total_ns / count as u128;
        let mean = Duration::from_nanos(u64::try_from(mean_ns).unwrap_or(u64::MAX));

        let observed_throughput = elapsed
            .filter(|e| !e.is_zero())
            .map(|e| count as f64 / e.as_secs_f64());

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            p95: nearest_rank(&sorted, 95),
            observed_throughput,
            clamped_samples: 0,
        })
    }

    pub fn violates_max_response_time(&self, limit: Duration) -> bool {
        self.max > limit
    }
}

/// Nearest-rank percentile of a sorted, non-empty slice.
///
/// `rank = ceil(p / 100 * n)`, 1-based.
pub fn nearest_rank(sorted: &[Duration], percentile: u32) -> Duration {
    let n = sorted.len();
    let rank = (percentile as usize * n).div_ceil(100).max(1);
    sorted[rank.min(n) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|v| Duration::from_millis(*v)).collect()
    }

    #[test]
    fn test_empty_is_none() {
        assert!(LatencySummary::from_response_times(&[], None).is_none());
    }

    #[test]
    fn test_basic_statistics() {
        let summary = LatencySummary::from_response_times(&ms(&[300, 100, 200]), None).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, Duration::from_millis(100));
        assert_eq!(summary.max, Duration::from_millis(300));
        assert_eq!(summary.mean, Duration::from_millis(200));
        assert_eq!(summary.p95, Duration::from_millis(300));
        assert!(summary.observed_throughput.is_none());
        assert!(summary.violates_max_response_time(Duration::from_millis(250)));
    }

    #[test]
    fn test_nearest_rank_p95() {
        let values: Vec<u64> = (1..=20).collect();
        assert_eq!(nearest_rank(&ms(&values), 95), Duration::from_millis(19));

        let values: Vec<u64> = (1..=100).collect();
        assert_eq!(nearest_rank(&ms(&values), 95), Duration::from_millis(95));

        assert_eq!(nearest_rank(&ms(&[42]), 95), Duration::from_millis(42));
    }

    #[test]
    fn test_throughput_uses_elapsed_time() {
        let summary =
            LatencySummary::from_response_times(&ms(&[10; 20]), Some(Duration::from_secs(2))).unwrap();
        assert_eq!(summary.observed_throughput, Some(10.0));
    }

    #[test]
    fn test_no_data_serializes_with_status() {
        let json = serde_json::to_value(PerformanceReport::NoData).unwrap();
        assert_eq!(json["status"], "no_data");
    }
}
