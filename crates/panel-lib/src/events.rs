//! Kubernetes events for the events panel
//!
//! Events are read from the core/v1 API (directly or through a proxy),
//! narrowed to objects whose name starts with the application name, and
//! ordered newest first.

use crate::error::FetchError;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Number of events shown when the caller does not choose
pub const DEFAULT_EVENT_LIMIT: usize = 30;

/// Longest name Kubernetes accepts for a namespace
const MAX_NAMESPACE_LEN: usize = 63;

/// Whether `namespace` is a DNS-1123 label, the only form the API server
/// accepts for namespace names
pub fn is_valid_namespace(namespace: &str) -> bool {
    let bytes = namespace.as_bytes();
    let edge_ok = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    !bytes.is_empty()
        && bytes.len() <= MAX_NAMESPACE_LEN
        && bytes.first().is_some_and(edge_ok)
        && bytes.last().is_some_and(edge_ok)
        && bytes.iter().all(|b| edge_ok(b) || *b == b'-')
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvolvedObject {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub involved_object: InvolvedObject,
    #[serde(default)]
    pub last_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
}

impl KubeEvent {
    /// `lastTimestamp`, falling back to `eventTime`
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp.or(self.event_time)
    }

    pub fn is_warning(&self) -> bool {
        self.event_type == "Warning"
    }
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<KubeEvent>,
}

/// Events whose involved object name starts with `app_name`, newest first,
/// at most `limit` of them. Events without any timestamp sort last.
pub fn select_recent_events(events: Vec<KubeEvent>, app_name: &str, limit: usize) -> Vec<KubeEvent> {
    let mut selected: Vec<KubeEvent> = events
        .into_iter()
        .filter(|event| event.involved_object.name.starts_with(app_name))
        .collect();

    selected.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    selected.truncate(limit);
    selected
}

/// Client for the namespace events endpoint
#[derive(Debug, Clone)]
pub struct EventsClient {
    client: Client,
    base_url: Url,
}

impl EventsClient {
    /// `base_url` is the Kubernetes API root, e.g. `http://localhost:8001`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).context("Invalid Kubernetes API URL")?;

        Ok(Self { client, base_url })
    }

    /// All events in `namespace`
    pub async fn list(&self, namespace: &str) -> Result<Vec<KubeEvent>, FetchError> {
        if !is_valid_namespace(namespace) {
            return Err(FetchError::Transport(format!("invalid namespace {namespace:?}")));
        }

        let url = self
            .base_url
            .join(&format!("api/v1/namespaces/{namespace}/events"))
            .map_err(|e| FetchError::Transport(format!("invalid namespace {namespace}: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let list: EventList = serde_json::from_str(&body)?;

        debug!(namespace = %namespace, count = list.items.len(), "Fetched events");
        Ok(list.items)
    }

    /// Recent events for an application
    pub async fn recent(
        &self,
        namespace: &str,
        app_name: &str,
        limit: usize,
    ) -> Result<Vec<KubeEvent>, FetchError> {
        let events = self.list(namespace).await?;
        Ok(select_recent_events(events, app_name, limit))
    }
}
