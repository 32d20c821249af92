//! PromQL construction for the fixed metric set

use crate::models::{MetricKey, WorkloadTarget};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default window for `rate()` expressions
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(2 * 60);

/// Query expression per metric key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuerySet {
    queries: BTreeMap<MetricKey, String>,
}

impl MetricQuerySet {
    pub fn get(&self, key: MetricKey) -> Option<&str> {
        self.queries.get(&key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, &str)> {
        self.queries.iter().map(|(k, q)| (*k, q.as_str()))
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl FromIterator<(MetricKey, String)> for MetricQuerySet {
    fn from_iter<I: IntoIterator<Item = (MetricKey, String)>>(iter: I) -> Self {
        Self {
            queries: iter.into_iter().collect(),
        }
    }
}

/// Builds the query set for a workload.
///
/// Pods are matched with `pod=~"<workload>.*"`, a prefix heuristic that also
/// matches any other pod whose name starts with the workload name.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    rate_window: Duration,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_WINDOW)
    }
}

impl QueryBuilder {
    pub fn new(rate_window: Duration) -> Self {
        Self { rate_window }
    }

    pub fn rate_window(&self) -> Duration {
        self.rate_window
    }

    pub fn build(&self, namespace: &str, workload: &str) -> MetricQuerySet {
        let selector = format!(
            r#"{{namespace="{}",pod=~"{}.*"}}"#,
            escape_label_value(namespace),
            escape_label_value(workload)
        );
        let window = format_range(self.rate_window);

        MetricKey::ALL
            .iter()
            .map(|key| {
                let expr = match key {
                    MetricKey::Cpu => format!(
                        "sum(rate(container_cpu_usage_seconds_total{selector}[{window}]))"
                    ),
                    MetricKey::Memory => {
                        format!("sum(container_memory_usage_bytes{selector})")
                    }
                    MetricKey::NetworkRx => format!(
                        "sum(rate(container_network_receive_bytes_total{selector}[{window}]))"
                    ),
                    MetricKey::NetworkTx => format!(
                        "sum(rate(container_network_transmit_bytes_total{selector}[{window}]))"
                    ),
                    MetricKey::DiskWrite => format!(
                        "sum(rate(container_fs_writes_bytes_total{selector}[{window}]))"
                    ),
                };
                (*key, expr)
            })
            .collect()
    }

    pub fn build_for(&self, target: &WorkloadTarget) -> MetricQuerySet {
        self.build(&target.namespace, &target.name)
    }
}

/// Prometheus duration literal, using the largest whole unit
fn format_range(window: Duration) -> String {
    let secs = window.as_secs().max(1);
    if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

fn escape_label_value(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}
