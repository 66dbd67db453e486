//! Bridge metrics.
//!
//! Free functions write through the `metrics` facade; [`TransactionStats`]
//! keeps an in-memory summary for CLI reports.

use std::collections::BTreeMap;

use contracts::{MessageType, ResultCode};
use metrics::{counter, gauge, histogram};

/// One serviced transaction
pub fn record_transaction(kind: MessageType, result: ResultCode, latency_us: f64) {
    counter!(
        "tracker_bridge_transactions_total",
        "kind" => kind.as_str(),
        "result" => result.as_str()
    )
    .increment(1);
    histogram!("tracker_bridge_transaction_latency_us").record(latency_us);
}

/// A request frame that could not be decoded
pub fn record_parse_failure() {
    counter!("tracker_bridge_parse_failures_total").increment(1);
}

/// The service loop gave up waiting for a client and released the to-server semaphore
pub fn record_start_timeout() {
    counter!("tracker_bridge_start_timeouts_total").increment(1);
}

/// The service loop body failed; `consecutive` counts crashes since the last clean run
pub fn record_loop_crash(consecutive: u32) {
    counter!("tracker_bridge_loop_crashes_total").increment(1);
    gauge!("tracker_bridge_loop_consecutive_crashes").set(consecutive as f64);
}

/// Registry population
pub fn record_tracker_counts(registered: usize, added: usize, activated: usize) {
    gauge!("tracker_bridge_trackers", "state" => "registered").set(registered as f64);
    gauge!("tracker_bridge_trackers", "state" => "added").set(added as f64);
    gauge!("tracker_bridge_trackers", "state" => "activated").set(activated as f64);
}

/// A host registration attempt failed and will be retried
pub fn record_spawn_retry(serial: &str) {
    counter!(
        "tracker_bridge_spawn_retries_total",
        "serial" => serial.to_string()
    )
    .increment(1);
}

/// In-memory transaction tally
#[derive(Debug, Clone, Default)]
pub struct TransactionStats {
    total: u64,
    failures: u64,
    by_result: BTreeMap<&'static str, u64>,
    latency_us: RunningStats,
}

impl TransactionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ResultCode, latency_us: f64) {
        self.total += 1;
        if result != ResultCode::Ok {
            self.failures += 1;
        }
        *self.by_result.entry(result.as_str()).or_insert(0) += 1;
        self.latency_us.push(latency_us);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn summary(&self) -> TransactionSummary {
        TransactionSummary {
            total: self.total,
            failures: self.failures,
            failure_rate: if self.total > 0 {
                self.failures as f64 / self.total as f64 * 100.0
            } else {
                0.0
            },
            latency_us: StatsSummary::from(&self.latency_us),
            by_result: self.by_result.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionSummary {
    pub total: u64,
    pub failures: u64,
    pub failure_rate: f64,
    pub latency_us: StatsSummary,
    pub by_result: BTreeMap<&'static str, u64>,
}

impl std::fmt::Display for TransactionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Transaction Summary ===")?;
        writeln!(f, "Total transactions: {}", self.total)?;
        writeln!(
            f,
            "Failures: {} ({:.2}%)",
            self.failures, self.failure_rate
        )?;
        writeln!(f, "Latency (us): {}", self.latency_us)?;
        if !self.by_result.is_empty() {
            writeln!(f, "Results:")?;
            for (result, count) in &self.by_result {
                writeln!(f, "  {}: {}", result, count)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_transaction_stats_tally() {
        let mut stats = TransactionStats::new();
        stats.push(ResultCode::Ok, 120.0);
        stats.push(ResultCode::Ok, 80.0);
        stats.push(ResultCode::BadRequest, 100.0);

        let summary = stats.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.failures, 1);
        assert!((summary.failure_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.by_result.get("ok"), Some(&2));
        assert_eq!(summary.by_result.get("bad_request"), Some(&1));
        assert!((summary.latency_us.mean - 100.0).abs() < 1e-9);

        let text = summary.to_string();
        assert!(text.contains("Total transactions: 3"), "got: {text}");
        assert!(text.contains("bad_request: 1"), "got: {text}");
    }

    #[test]
    fn test_empty_summary_prints_na() {
        let stats = TransactionStats::new();
        assert_eq!(stats.summary().latency_us.to_string(), "N/A");
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: the facade discards values
        record_transaction(MessageType::Ping, ResultCode::Ok, 42.0);
        record_parse_failure();
        record_start_timeout();
        record_loop_crash(1);
        record_tracker_counts(3, 2, 1);
        record_spawn_retry("S1");
    }
}
