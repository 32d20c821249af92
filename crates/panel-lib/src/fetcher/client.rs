//! Prometheus HTTP API client

use super::{async_trait, SeriesSource};
use crate::error::FetchError;
use crate::models::{MetricSeries, SeriesPoint, TimeWindow};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Per-request timeout when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Prometheus query API.
///
/// `base_url` points at the API root, e.g. `http://prometheus:9090/api/v1`
/// or a same-origin proxy path on the dashboard host.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: Client,
    base_url: Url,
}

impl PrometheusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Self::with_client(client, base_url)
    }

    /// Use an existing client (shared connection pool)
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        // Url::join replaces the last segment unless the base ends in '/'
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).context("Invalid Prometheus URL")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    /// Whether the backend answers its build-info endpoint with a 2xx
    pub async fn probe(&self) -> bool {
        let url = match self.endpoint("status/buildinfo") {
            Ok(url) => url,
            Err(_) => return false,
        };

        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Prometheus probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl SeriesSource for PrometheusClient {
    async fn fetch_range(
        &self,
        query: &str,
        window: &TimeWindow,
    ) -> Result<MetricSeries, FetchError> {
        let url = self.endpoint("query_range")?;

        let response = self
            .client
            .get(url)
            .query(&[
                ("query", query.to_string()),
                ("start", window.start.to_string()),
                ("end", window.end.to_string()),
                ("step", window.step.to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        parse_range_response(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<QueryRangeData>,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    #[serde(default)]
    result: Vec<ResultSeries>,
}

#[derive(Debug, Deserialize)]
struct ResultSeries {
    /// Matrix results carry `values`
    #[serde(default)]
    values: Vec<Vec<Value>>,
    /// Vector results carry a single `value`
    #[serde(default)]
    value: Option<Vec<Value>>,
}

/// Classify and normalize a `query_range` response body.
///
/// Only the first result series is used; queries are expected to aggregate
/// down to a single series already.
pub fn parse_range_response(status: StatusCode, body: &str) -> Result<MetricSeries, FetchError> {
    let parsed: QueryRangeResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if status.is_success() => return Err(e.into()),
        Err(_) => return Err(FetchError::Transport(format!("HTTP {status}"))),
    };

    if parsed.status != "success" {
        let message = parsed
            .error
            .unwrap_or_else(|| format!("status {}", parsed.status));
        return Err(FetchError::BackendRejected(message));
    }

    if !status.is_success() {
        return Err(FetchError::Transport(format!("HTTP {status}")));
    }

    let Some(first) = parsed.data.and_then(|d| d.result.into_iter().next()) else {
        return Ok(Vec::new());
    };

    if first.values.is_empty() {
        if let Some(pair) = first.value {
            return Ok(vec![to_point(&pair)?]);
        }
    }

    first.values.iter().map(|pair| to_point(pair)).collect()
}

fn to_point(pair: &[Value]) -> Result<SeriesPoint, FetchError> {
    let timestamp = pair
        .first()
        .and_then(number_of)
        .ok_or_else(|| FetchError::Parse(format!("sample without timestamp: {pair:?}")))?;

    Ok(SeriesPoint {
        timestamp,
        value: pair.get(1).map(sample_value).unwrap_or(0.0),
    })
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

/// Sample values arrive as strings; anything unusable becomes 0
fn sample_value(value: &Value) -> f64 {
    number_of(value).unwrap_or(0.0)
}
