//! Test doubles shared by the aggregator and poller tests

use crate::error::FetchError;
use crate::fetcher::{async_trait, SeriesSource};
use crate::models::{MetricSeries, TimeWindow};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Handler = Box<dyn Fn(&str) -> Result<MetricSeries, FetchError> + Send + Sync>;
type DelayFn = Box<dyn Fn(&str) -> Duration + Send + Sync>;

/// In-memory [`SeriesSource`] answering from a closure, with optional delays
pub struct ScriptedSource {
    handler: Handler,
    delay: Option<DelayFn>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(
        handler: impl Fn(&str) -> Result<MetricSeries, FetchError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: None,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Sleep on the tokio clock before answering
    pub fn with_delay(mut self, delay: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SeriesSource for ScriptedSource {
    async fn fetch_range(
        &self,
        query: &str,
        _window: &TimeWindow,
    ) -> Result<MetricSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(query)).await;
        }

        (self.handler)(query)
    }
}
