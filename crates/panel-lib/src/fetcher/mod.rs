//! Range-query fetching and response normalization
//!
//! A [`SeriesSource`] executes one query over a time window and returns a
//! normalized [`MetricSeries`]. [`PrometheusClient`] is the HTTP
//! implementation; tests substitute in-memory sources.

mod client;


pub use self::client::{parse_range_response, PrometheusClient, DEFAULT_REQUEST_TIMEOUT};

use crate::error::FetchError;
use crate::models::{MetricSeries, TimeWindow};

pub use async_trait::async_trait;

/// Executes range queries against a time-series backend
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Fetch one query over `window`, normalized to a point sequence
    async fn fetch_range(
        &self,
        query: &str,
        window: &TimeWindow,
    ) -> Result<MetricSeries, FetchError>;
}
