//! Core data models for the workload panels

use crate::error::FetchErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// One entry of an application's live resource tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// Resolved identity of the workload whose metrics are fetched
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadTarget {
    pub name: String,
    pub namespace: String,
}

impl WorkloadTarget {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for WorkloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Fixed set of metrics tracked for every workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Cpu,
    Memory,
    NetworkRx,
    NetworkTx,
    DiskWrite,
}

impl MetricKey {
    pub const ALL: [MetricKey; 5] = [
        MetricKey::Cpu,
        MetricKey::Memory,
        MetricKey::NetworkRx,
        MetricKey::NetworkTx,
        MetricKey::DiskWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Cpu => "cpu",
            MetricKey::Memory => "memory",
            MetricKey::NetworkRx => "network_rx",
            MetricKey::NetworkTx => "network_tx",
            MetricKey::DiskWrite => "disk_write",
        }
    }

    /// Whether the query for this key is a rate over a window
    pub fn is_rate(&self) -> bool {
        !matches!(self, MetricKey::Memory)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized sample. `value` is always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Unix seconds, possibly fractional
    pub timestamp: f64,
    pub value: f64,
}

/// Samples in upstream order
pub type MetricSeries = Vec<SeriesPoint>;

/// Range query window in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
    /// Resolution step in seconds
    pub step: u64,
}

impl TimeWindow {
    /// Window of `lookback` ending at `end`
    pub fn trailing(end: i64, lookback: Duration, step: Duration) -> Self {
        let lookback = i64::try_from(lookback.as_secs()).unwrap_or(i64::MAX);
        Self {
            start: end.saturating_sub(lookback),
            end,
            step: step.as_secs().max(1),
        }
    }

    /// Window of `lookback` ending now
    pub fn ending_now(lookback: Duration, step: Duration) -> Self {
        Self::trailing(chrono::Utc::now().timestamp(), lookback, step)
    }
}

/// Non-fatal record of a key that failed while others succeeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub key: MetricKey,
    pub kind: FetchErrorKind,
    pub message: String,
}

/// Loading/error state attached to a result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsStatus {
    pub loading: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// How a completed cycle went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Ok,
    Partial,
    Failed,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Ok => "ok",
            CycleOutcome::Partial => "partial",
            CycleOutcome::Failed => "failed",
        }
    }
}

/// Series per metric key plus status. Replaced as a whole on every cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub series: BTreeMap<MetricKey, MetricSeries>,
    pub status: MetricsStatus,
}

impl MetricsResult {
    /// Fresh result for a newly started target
    pub fn loading() -> Self {
        Self {
            series: BTreeMap::new(),
            status: MetricsStatus {
                loading: true,
                ..Default::default()
            },
        }
    }

    /// Empty result with no cycle pending
    pub fn idle() -> Self {
        Self::default()
    }

    /// Result of a cycle in which every key failed
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            series: BTreeMap::new(),
            status: MetricsStatus {
                loading: false,
                error: Some(message.into()),
                diagnostics: Vec::new(),
            },
        }
    }

    pub fn get(&self, key: MetricKey) -> Option<&MetricSeries> {
        self.series.get(&key)
    }

    /// Value of the most recent point for `key`
    pub fn latest(&self, key: MetricKey) -> Option<f64> {
        self.series
            .get(&key)
            .and_then(|series| series.last())
            .map(|point| point.value)
    }

    pub fn outcome(&self) -> CycleOutcome {
        if self.status.error.is_some() {
            CycleOutcome::Failed
        } else if !self.status.diagnostics.is_empty() {
            CycleOutcome::Partial
        } else {
            CycleOutcome::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_key_names() {
        let names: Vec<&str> = MetricKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["cpu", "memory", "network_rx", "network_tx", "disk_write"]
        );
        assert!(!MetricKey::Memory.is_rate());
        assert!(MetricKey::DiskWrite.is_rate());
    }

    #[test]
    fn test_metric_key_serializes_as_map_key() {
        let mut result = MetricsResult::idle();
        result.series.insert(MetricKey::NetworkRx, vec![]);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["series"]["network_rx"].is_array());
    }

    #[test]
    fn test_time_window_trailing() {
        let window =
            TimeWindow::trailing(10_000, Duration::from_secs(3600), Duration::from_secs(60));
        assert_eq!(window.start, 6_400);
        assert_eq!(window.end, 10_000);
        assert_eq!(window.step, 60);

        // Sub-second steps are clamped so the backend never sees step=0
        let window = TimeWindow::trailing(100, Duration::from_secs(10), Duration::ZERO);
        assert_eq!(window.step, 1);
    }

    #[test]
    fn test_time_window_huge_lookback_saturates() {
        let window = TimeWindow::trailing(
            1_700_000_000,
            Duration::from_secs(u64::MAX),
            Duration::from_secs(60),
        );
        assert_eq!(window.start, 1_700_000_000 - i64::MAX);
        assert!(window.start < window.end);

        let window =
            TimeWindow::trailing(-10, Duration::from_secs(i64::MAX as u64), Duration::ZERO);
        assert_eq!(window.start, i64::MIN);
    }

    #[test]
    fn test_latest_value() {
        let mut result = MetricsResult::idle();
        result.series.insert(
            MetricKey::Cpu,
            vec![
                SeriesPoint {
                    timestamp: 1.0,
                    value: 0.25,
                },
                SeriesPoint {
                    timestamp: 2.0,
                    value: 0.5,
                },
            ],
        );
        result.series.insert(MetricKey::Memory, vec![]);

        assert_eq!(result.latest(MetricKey::Cpu), Some(0.5));
        assert_eq!(result.latest(MetricKey::Memory), None);
        assert_eq!(result.latest(MetricKey::DiskWrite), None);
    }

    #[test]
    fn test_outcome() {
        assert_eq!(MetricsResult::idle().outcome(), CycleOutcome::Ok);
        assert_eq!(MetricsResult::failed("boom").outcome(), CycleOutcome::Failed);

        let mut partial = MetricsResult::idle();
        partial.status.diagnostics.push(Diagnostic {
            key: MetricKey::Cpu,
            kind: FetchErrorKind::Transport,
            message: "connection refused".to_string(),
        });
        assert_eq!(partial.outcome(), CycleOutcome::Partial);
    }
}
