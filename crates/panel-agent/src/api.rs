//! HTTP API for the panel, health checks and Prometheus metrics

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use panel_lib::{
    discovery::FALLBACK_NAMESPACE,
    events::{is_valid_namespace, DEFAULT_EVENT_LIMIT},
    health::{ComponentStatus, HealthRegistry},
    EventsClient, FetchError, MetricsResult, Poller, ResourceNode, TargetResolver,
    WorkloadTarget,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub poller: Mutex<Poller>,
    pub resolver: TargetResolver,
    pub events: EventsClient,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        poller: Poller,
        resolver: TargetResolver,
        events: EventsClient,
    ) -> Self {
        Self {
            health_registry,
            poller: Mutex::new(poller),
            resolver,
            events,
        }
    }
}

/// Body of `PUT /api/v1/tree`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeUpdate {
    pub nodes: Vec<ResourceNode>,
    #[serde(default)]
    pub default_namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResponse {
    pub target: Option<WorkloadTarget>,
    pub epoch: u64,
}

/// Body of `GET /api/v1/metrics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelSnapshot {
    pub target: Option<WorkloadTarget>,
    pub result: MetricsResult,
}

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    pub app: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Resolve the pushed tree and retarget the poller
async fn put_tree(
    State(state): State<Arc<AppState>>,
    Json(update): Json<TreeUpdate>,
) -> impl IntoResponse {
    let target = state
        .resolver
        .resolve(&update.nodes, update.default_namespace.as_deref());

    let mut poller = state.poller.lock().await;
    match &target {
        Some(target) => info!(workload = %target, "Resolved workload from tree"),
        None => info!(
            kind = state.resolver.kind(),
            nodes = update.nodes.len(),
            "No workload in tree"
        ),
    }
    poller.update_target(target.clone());

    Json(TargetResponse {
        target,
        epoch: poller.epoch(),
    })
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let poller = state.poller.lock().await;

    Json(PanelSnapshot {
        target: poller.target().cloned(),
        result: poller.snapshot().as_ref().clone(),
    })
}

async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsParams>,
) -> impl IntoResponse {
    let namespace = params
        .namespace
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| FALLBACK_NAMESPACE.to_string());
    let limit = params.limit.unwrap_or(DEFAULT_EVENT_LIMIT);

    if !is_valid_namespace(&namespace) {
        let body = ErrorBody {
            error: format!("invalid namespace {namespace:?}"),
            kind: "invalid_request",
        };
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    match state.events.recent(&namespace, &params.app, limit).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => {
            warn!(namespace = %namespace, app = %params.app, error = %e, "Failed to list events");
            let body = error_body(&e);
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}

fn error_body(e: &FetchError) -> ErrorBody {
    ErrorBody {
        error: e.to_string(),
        kind: e.kind().as_str(),
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/tree", put(put_tree))
        .route("/api/v1/metrics", get(get_metrics))
        .route("/api/v1/events", get(get_events))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
