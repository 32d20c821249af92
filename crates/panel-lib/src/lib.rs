//! Core library for workload resource panels
//!
//! This crate provides the core functionality for:
//! - Resolving the primary workload from an application's resource tree
//! - Building per-metric PromQL range queries
//! - Fetching and normalizing range series from Prometheus
//! - Aggregating concurrent fetches into one panel result
//! - Periodic refresh with epoch-guarded cancellation
//! - Kubernetes events for the events panel
//! - Health checks and observability

pub mod aggregator;
pub mod discovery;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod health;
pub mod models;
pub mod observability;
pub mod poller;
pub mod query;
pub mod readiness;

#[cfg(test)]
mod test_support;

pub use aggregator::{aggregate, MetricsAggregator};
pub use discovery::TargetResolver;
pub use error::{FetchError, FetchErrorKind, ReadyError};
pub use events::{EventsClient, KubeEvent};
pub use fetcher::{PrometheusClient, SeriesSource};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PanelLogger, PanelMetrics};
pub use poller::{Poller, PollerConfig};
pub use query::{MetricQuerySet, QueryBuilder};
pub use readiness::await_ready;
