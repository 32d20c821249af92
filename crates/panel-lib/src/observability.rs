//! Observability infrastructure for the panels
//!
//! Provides:
//! - Prometheus metrics (cycle latency, cycle outcomes, fetch errors, skipped ticks)
//! - Structured JSON logging with tracing

use crate::models::{CycleOutcome, MetricsResult, WorkloadTarget};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Histogram buckets for cycle latency (in seconds)
const CYCLE_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PanelMetricsInner> = OnceLock::new();

struct PanelMetricsInner {
    cycle_latency_seconds: Histogram,
    cycles: IntCounterVec,
    fetch_errors: IntCounterVec,
    skipped_ticks: IntCounter,
    discarded_results: IntCounter,
    active_targets: IntGauge,
}

impl PanelMetricsInner {
    fn new() -> Self {
        Self {
            cycle_latency_seconds: register_histogram!(
                "workload_panels_cycle_latency_seconds",
                "Time from the start of a fetch cycle until every query settled",
                CYCLE_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_latency_seconds"),

            cycles: register_int_counter_vec!(
                "workload_panels_cycles_total",
                "Completed fetch cycles by outcome",
                &["outcome"]
            )
            .expect("Failed to register cycles_total"),

            fetch_errors: register_int_counter_vec!(
                "workload_panels_fetch_errors_total",
                "Failed series fetches by metric key and error kind",
                &["key", "kind"]
            )
            .expect("Failed to register fetch_errors_total"),

            skipped_ticks: register_int_counter!(
                "workload_panels_skipped_ticks_total",
                "Timer ticks skipped because a cycle was still in flight"
            )
            .expect("Failed to register skipped_ticks_total"),

            discarded_results: register_int_counter!(
                "workload_panels_discarded_results_total",
                "Cycle results dropped because the poller was stopped or retargeted"
            )
            .expect("Failed to register discarded_results_total"),

            active_targets: register_int_gauge!(
                "workload_panels_active_targets",
                "Number of pollers currently running"
            )
            .expect("Failed to register active_targets"),
        }
    }
}

/// Panel metrics for Prometheus exposition
///
/// Lightweight handle to the process-wide instance; clones share it.
#[derive(Clone)]
pub struct PanelMetrics {
    _private: (),
}

impl Default for PanelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PanelMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PanelMetricsInner {
        GLOBAL_METRICS.get_or_init(PanelMetricsInner::new)
    }

    pub fn observe_cycle(&self, elapsed: Duration, outcome: CycleOutcome) {
        self.inner()
            .cycle_latency_seconds
            .observe(elapsed.as_secs_f64());
        self.inner()
            .cycles
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn inc_fetch_errors(&self, key: &str, kind: &str) {
        self.inner()
            .fetch_errors
            .with_label_values(&[key, kind])
            .inc();
    }

    pub fn inc_skipped_ticks(&self) {
        self.inner().skipped_ticks.inc();
    }

    pub fn inc_discarded_results(&self) {
        self.inner().discarded_results.inc();
    }

    pub fn inc_active_targets(&self) {
        self.inner().active_targets.inc();
    }

    pub fn dec_active_targets(&self) {
        self.inner().active_targets.dec();
    }
}

/// Structured logger for panel lifecycle events
#[derive(Clone)]
pub struct PanelLogger {
    instance: String,
}

impl PanelLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Log a completed cycle
    pub fn log_cycle(&self, target: &WorkloadTarget, result: &MetricsResult, elapsed: Duration) {
        let outcome = result.outcome();
        match outcome {
            CycleOutcome::Ok => {
                debug!(
                    event = "cycle_completed",
                    instance = %self.instance,
                    workload = %target,
                    outcome = outcome.as_str(),
                    series = result.series.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Metrics cycle completed"
                );
            }
            CycleOutcome::Partial => {
                let failed: Vec<&str> = result
                    .status
                    .diagnostics
                    .iter()
                    .map(|d| d.key.as_str())
                    .collect();
                info!(
                    event = "cycle_completed",
                    instance = %self.instance,
                    workload = %target,
                    outcome = outcome.as_str(),
                    failed_keys = ?failed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Metrics cycle completed with missing series"
                );
            }
            CycleOutcome::Failed => {
                warn!(
                    event = "cycle_completed",
                    instance = %self.instance,
                    workload = %target,
                    outcome = outcome.as_str(),
                    error = result.status.error.as_deref().unwrap_or_default(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Metrics cycle failed"
                );
            }
        }
    }

    /// Log a timer tick that found the previous cycle unsettled
    pub fn log_tick_skipped(&self, target: &WorkloadTarget) {
        debug!(
            event = "tick_skipped",
            instance = %self.instance,
            workload = %target,
            "Previous cycle still in flight, skipping tick"
        );
    }

    /// Log a result that arrived after stop or retarget
    pub fn log_discarded(&self, target: &WorkloadTarget, epoch: u64) {
        debug!(
            event = "result_discarded",
            instance = %self.instance,
            workload = %target,
            epoch = epoch,
            "Dropping result from superseded cycle"
        );
    }

    /// Log a poller target change
    pub fn log_target_change(&self, old: Option<&WorkloadTarget>, new: Option<&WorkloadTarget>) {
        info!(
            event = "target_changed",
            instance = %self.instance,
            old_target = ?old.map(ToString::to_string),
            new_target = ?new.map(ToString::to_string),
            "Workload target changed"
        );
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "agent_started",
            instance = %self.instance,
            agent_version = %version,
            "Panel agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Panel agent shutting down"
        );
    }
}
