//! Periodic refresh of a panel's metrics
//!
//! A [`Poller`] owns one panel's [`MetricsResult`]. `start` runs a cycle
//! immediately and then on every interval tick; `stop` cancels the timer
//! and bumps the epoch so that any cycle still in flight is discarded when
//! it settles. At most one cycle runs per target; ticks that find the
//! previous cycle unsettled are skipped.


use crate::aggregator::MetricsAggregator;
use crate::health::HealthRegistry;
use crate::models::{MetricsResult, TimeWindow, WorkloadTarget};
use crate::observability::{PanelLogger, PanelMetrics};
use crate::query::QueryBuilder;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Configuration for the refresh loop
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between cycle starts (default: 10 seconds)
    pub interval: Duration,
    /// How far back each range query reaches (default: 1 hour)
    pub lookback: Duration,
    /// Range query resolution (default: 60 seconds)
    pub step: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            lookback: Duration::from_secs(60 * 60),
            step: Duration::from_secs(60),
        }
    }
}

/// Epoch and in-flight flag, guarded together so a cycle's epoch check and
/// its publish cannot interleave with `start`/`stop`
#[derive(Debug, Default)]
struct CycleState {
    epoch: u64,
    in_flight: bool,
}

enum TickAction {
    /// Poller moved on to a newer epoch; the timer should exit
    Stale,
    /// Previous cycle has not settled
    Busy,
    Started,
}

struct Shared {
    state: Mutex<CycleState>,
    result_tx: watch::Sender<Arc<MetricsResult>>,
    skipped_ticks: AtomicU64,
    discarded_results: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CycleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a new epoch and publish `initial` for it
    fn advance(&self, initial: MetricsResult) -> u64 {
        let mut state = self.lock();
        state.epoch += 1;
        state.in_flight = false;
        self.result_tx.send_replace(Arc::new(initial));
        state.epoch
    }

    fn try_begin(&self, epoch: u64) -> TickAction {
        let mut state = self.lock();
        if state.epoch != epoch {
            TickAction::Stale
        } else if state.in_flight {
            TickAction::Busy
        } else {
            state.in_flight = true;
            TickAction::Started
        }
    }

    /// Publish a settled cycle's result if its epoch is still current
    fn finish(&self, epoch: u64, result: Arc<MetricsResult>) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        state.in_flight = false;
        self.result_tx.send_replace(result);
        true
    }
}

/// Everything a timer task needs to run cycles for one target
#[derive(Clone)]
struct CycleContext {
    shared: Arc<Shared>,
    aggregator: Arc<MetricsAggregator>,
    queries: QueryBuilder,
    config: PollerConfig,
    target: WorkloadTarget,
    metrics: PanelMetrics,
    logger: PanelLogger,
    health: Option<HealthRegistry>,
}

impl CycleContext {
    async fn run_timer(self, epoch: u64) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // The first tick completes immediately
            ticker.tick().await;

            match self.shared.try_begin(epoch) {
                TickAction::Stale => break,
                TickAction::Busy => {
                    self.shared.skipped_ticks.fetch_add(1, Ordering::Relaxed);
                    self.metrics.inc_skipped_ticks();
                    self.logger.log_tick_skipped(&self.target);
                }
                TickAction::Started => {
                    tokio::spawn(self.clone().run_cycle(epoch));
                }
            }
        }
    }

    async fn run_cycle(self, epoch: u64) {
        let started = Instant::now();
        let queries = self.queries.build_for(&self.target);
        let window = TimeWindow::ending_now(self.config.lookback, self.config.step);

        let result = Arc::new(self.aggregator.collect(&queries, &window).await);
        let elapsed = started.elapsed();

        if !self.shared.finish(epoch, result.clone()) {
            self.shared.discarded_results.fetch_add(1, Ordering::Relaxed);
            self.metrics.inc_discarded_results();
            self.logger.log_discarded(&self.target, epoch);
            return;
        }

        self.metrics.observe_cycle(elapsed, result.outcome());
        self.logger.log_cycle(&self.target, &result, elapsed);

        if let Some(health) = &self.health {
            health.record_cycle(&result).await;
        }
    }
}

/// Refresh lifecycle for a single panel
pub struct Poller {
    aggregator: Arc<MetricsAggregator>,
    queries: QueryBuilder,
    config: PollerConfig,
    shared: Arc<Shared>,
    metrics: PanelMetrics,
    logger: PanelLogger,
    health: Option<HealthRegistry>,
    target: Option<WorkloadTarget>,
    timer: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(aggregator: Arc<MetricsAggregator>, queries: QueryBuilder, config: PollerConfig) -> Self {
        let (result_tx, _) = watch::channel(Arc::new(MetricsResult::idle()));

        Self {
            aggregator,
            queries,
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(CycleState::default()),
                result_tx,
                skipped_ticks: AtomicU64::new(0),
                discarded_results: AtomicU64::new(0),
            }),
            metrics: PanelMetrics::new(),
            logger: PanelLogger::new("panel"),
            health: None,
            target: None,
            timer: None,
        }
    }

    /// Report every completed cycle to `health`
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_logger(mut self, logger: PanelLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Receiver that observes every published result
    pub fn subscribe(&self) -> watch::Receiver<Arc<MetricsResult>> {
        self.shared.result_tx.subscribe()
    }

    /// Most recently published result
    pub fn snapshot(&self) -> Arc<MetricsResult> {
        self.shared.result_tx.borrow().clone()
    }

    pub fn target(&self) -> Option<&WorkloadTarget> {
        self.target.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.shared.lock().epoch
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.shared.skipped_ticks.load(Ordering::Relaxed)
    }

    pub fn discarded_results(&self) -> u64 {
        self.shared.discarded_results.load(Ordering::Relaxed)
    }

    /// Start polling `target`.
    ///
    /// A run for a different target is stopped first; starting the target
    /// that is already running is a no-op. Must be called from within a
    /// tokio runtime.
    pub fn start(&mut self, target: WorkloadTarget) {
        if self.is_running() && self.target.as_ref() == Some(&target) {
            debug!(workload = %target, "Poller already running for target");
            return;
        }

        let previous = self.target.clone();
        if self.is_running() {
            self.halt();
        }

        let epoch = self.shared.advance(MetricsResult::loading());
        self.logger
            .log_target_change(previous.as_ref(), Some(&target));
        info!(
            workload = %target,
            epoch,
            interval_secs = self.config.interval.as_secs(),
            "Starting metrics poller"
        );

        let context = CycleContext {
            shared: self.shared.clone(),
            aggregator: self.aggregator.clone(),
            queries: self.queries.clone(),
            config: self.config.clone(),
            target: target.clone(),
            metrics: self.metrics.clone(),
            logger: self.logger.clone(),
            health: self.health.clone(),
        };

        self.timer = Some(tokio::spawn(context.run_timer(epoch)));
        self.target = Some(target);
        self.metrics.inc_active_targets();
    }

    /// Cancel the timer and discard any cycle still in flight
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        let previous = self.target.clone();
        self.halt();
        self.shared.advance(MetricsResult::idle());
        self.logger.log_target_change(previous.as_ref(), None);
        info!("Stopped metrics poller");
    }

    /// Apply a newly resolved target: `None` stops, a different target
    /// restarts, the same target keeps running
    pub fn update_target(&mut self, target: Option<WorkloadTarget>) {
        match target {
            Some(target) => self.start(target),
            None => self.stop(),
        }
    }

    fn halt(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            self.metrics.dec_active_targets();
        }
        self.target = None;
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if self.is_running() {
            self.halt();
            self.shared.advance(MetricsResult::idle());
        }
    }
}
