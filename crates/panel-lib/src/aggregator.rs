//! Concurrent fan-out over a query set with soft degradation

use crate::error::FetchError;
use crate::fetcher::SeriesSource;
use crate::models::{Diagnostic, MetricKey, MetricSeries, MetricsResult, MetricsStatus, TimeWindow};
use crate::observability::PanelMetrics;
use crate::query::MetricQuerySet;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs every query of a set concurrently and consolidates the outcomes
pub struct MetricsAggregator {
    source: Arc<dyn SeriesSource>,
    metrics: PanelMetrics,
}

impl MetricsAggregator {
    pub fn new(source: Arc<dyn SeriesSource>) -> Self {
        Self {
            source,
            metrics: PanelMetrics::new(),
        }
    }

    /// Fetch all queries and wait for every one of them to settle
    pub async fn collect(&self, queries: &MetricQuerySet, window: &TimeWindow) -> MetricsResult {
        let fetches = queries.iter().map(|(key, query)| async move {
            let outcome = self.source.fetch_range(query, window).await;
            (key, outcome)
        });

        let outcomes = join_all(fetches).await;

        for (key, outcome) in &outcomes {
            if let Err(e) = outcome {
                self.metrics.inc_fetch_errors(key.as_str(), e.kind().as_str());
            }
        }

        aggregate(outcomes)
    }
}

/// Consolidate per-key outcomes.
///
/// All failed: the result carries the first error's message and no series.
/// Otherwise failed keys map to an empty series plus a diagnostic entry.
pub fn aggregate(outcomes: Vec<(MetricKey, Result<MetricSeries, FetchError>)>) -> MetricsResult {
    if !outcomes.is_empty() && outcomes.iter().all(|(_, outcome)| outcome.is_err()) {
        let message = outcomes
            .iter()
            .find_map(|(_, outcome)| outcome.as_ref().err())
            .map(ToString::to_string)
            .unwrap_or_default();
        warn!(error = %message, "All metric queries failed");
        return MetricsResult::failed(message);
    }

    let mut series = BTreeMap::new();
    let mut diagnostics = Vec::new();

    for (key, outcome) in outcomes {
        match outcome {
            Ok(points) => {
                debug!(key = %key, points = points.len(), "Fetched series");
                series.insert(key, points);
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Metric query failed, showing empty series");
                diagnostics.push(Diagnostic {
                    key,
                    kind: e.kind(),
                    message: e.to_string(),
                });
                series.insert(key, MetricSeries::new());
            }
        }
    }

    MetricsResult {
        series,
        status: MetricsStatus {
            loading: false,
            error: None,
            diagnostics,
        },
    }
}
