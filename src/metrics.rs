//! Latency and search statistics.
//!
//! # Latency accumulation
//!
//! [`LatencyStats`] is a plain value: callers own it, feed it one sample per
//! query and read the aggregate at the end. Nothing here is global, so two
//! evaluations can run side by side without sharing state.
//!
//! ```
//! use forge_knn::LatencyStats;
//! use std::time::Duration;
//!
//! let mut stats = LatencyStats::default();
//! stats.record(Duration::from_millis(4));
//! stats.record(Duration::from_millis(10));
//! assert_eq!(stats.min_ms(), 4);
//! assert_eq!(stats.max_ms(), 10);
//! assert_eq!(stats.avg_ms(), 7);
//! ```
//!
//! # Search statistics
//!
//! Use [`SearchStatistics`] to profile a single query:
//!
//! ```ignore
//! let (results, stats) = index.search_with_stats(&query, 1)?;
//! println!("{}", stats.summary());
//! ```

use std::time::Duration;

/// Running min/max/total over a series of latencies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatencyStats {
    min: Option<Duration>,
    max: Duration,
    total: Duration,
    count: u64,
}

impl LatencyStats {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample.
    pub fn record(&mut self, latency: Duration) {
        self.min = Some(self.min.map_or(latency, |min| min.min(latency)));
        self.max = self.max.max(latency);
        self.total += latency;
        self.count += 1;
    }

    /// Combine two accumulators.
    pub fn merge(mut self, other: LatencyStats) -> Self {
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = self.max.max(other.max);
        self.total += other.total;
        self.count += other.count;
        self
    }

    /// Number of samples recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Shortest sample, zero if none were recorded.
    pub fn min(&self) -> Duration {
        self.min.unwrap_or_default()
    }

    /// Longest sample, zero if none were recorded.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Sum of all samples.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Mean sample, zero if none were recorded.
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        // Divide in nanoseconds so large counts don't overflow u32.
        Duration::from_nanos((self.total.as_nanos() / self.count as u128) as u64)
    }

    /// Shortest sample in whole milliseconds, truncated.
    pub fn min_ms(&self) -> u64 {
        self.min().as_millis() as u64
    }

    /// Longest sample in whole milliseconds, truncated.
    pub fn max_ms(&self) -> u64 {
        self.max.as_millis() as u64
    }

    /// Mean sample in whole milliseconds, truncated.
    ///
    /// The mean is taken over exact durations and truncated once. Averaging
    /// per-query millisecond values instead can come out up to 1ms lower.
    pub fn avg_ms(&self) -> u64 {
        self.mean().as_millis() as u64
    }
}

/// Statistics about a single search operation.
#[derive(Clone, Debug, Default)]
pub struct SearchStatistics {
    /// Total query execution time.
    pub query_time: Duration,
    /// Number of records compared against the query.
    pub vectors_scanned: usize,
    /// Number of partitions the scan was split into (1 when sequential).
    pub partitions_scanned: usize,
}

impl SearchStatistics {
    /// Get query time in milliseconds.
    pub fn query_time_ms(&self) -> f32 {
        self.query_time.as_secs_f32() * 1000.0
    }

    /// Create a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "SearchStatistics:\n  \
             Time: {:.3}ms\n  \
             Vectors scanned: {}\n  \
             Partitions: {}",
            self.query_time_ms(),
            self.vectors_scanned,
            self.partitions_scanned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_latency_stats() {
        let stats = LatencyStats::new();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.min_ms(), 0);
        assert_eq!(stats.max_ms(), 0);
        assert_eq!(stats.avg_ms(), 0);
    }

    #[test]
    fn test_latency_truncates_to_millis() {
        let mut stats = LatencyStats::new();
        stats.record(Duration::from_micros(1_999));
        stats.record(Duration::from_micros(3_000));
        stats.record(Duration::from_micros(5_500));

        assert_eq!(stats.min_ms(), 1);
        assert_eq!(stats.max_ms(), 5);
        // total 10.499ms / 3 = 3.499ms
        assert_eq!(stats.avg_ms(), 3);
        assert_eq!(stats.total(), Duration::from_micros(10_499));
    }

    #[test]
    fn test_avg_truncates_once() {
        let mut stats = LatencyStats::new();
        stats.record(Duration::from_micros(1_900));
        stats.record(Duration::from_micros(900));
        // 2.8ms / 2 = 1.4ms. Truncating each sample first would give (1 + 0) / 2 = 0.
        assert_eq!(stats.avg_ms(), 1);
    }

    #[test]
    fn test_latency_merge() {
        let mut a = LatencyStats::new();
        a.record(Duration::from_millis(2));
        let mut b = LatencyStats::new();
        b.record(Duration::from_millis(8));

        let merged = a.merge(b).merge(LatencyStats::new());
        assert_eq!(merged.count(), 2);
        assert_eq!(merged.min_ms(), 2);
        assert_eq!(merged.max_ms(), 8);
        assert_eq!(merged.avg_ms(), 5);
    }

    #[test]
    fn test_search_statistics_summary() {
        let stats = SearchStatistics {
            query_time: Duration::from_micros(1500),
            vectors_scanned: 60_000,
            partitions_scanned: 60,
        };

        let summary = stats.summary();
        assert!(summary.contains("1.5"));
        assert!(summary.contains("60000"));
        assert!(summary.contains("Partitions: 60"));
    }
}
