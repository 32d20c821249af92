//! Integration tests for the agent API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use panel_agent::api::{create_router, AppState};
use panel_lib::{
    fetcher::{async_trait, SeriesSource},
    health::{components, ComponentHealth, HealthRegistry},
    EventsClient, FetchError, MetricSeries, MetricsAggregator, Poller, PollerConfig,
    QueryBuilder, SeriesPoint, TargetResolver, TimeWindow,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Answers every query with one point, except disk writes which fail
struct FixedSource;

#[async_trait]
impl SeriesSource for FixedSource {
    async fn fetch_range(
        &self,
        query: &str,
        _window: &TimeWindow,
    ) -> Result<MetricSeries, FetchError> {
        if query.contains("container_fs_writes_bytes_total") {
            return Err(FetchError::BackendRejected("unknown metric".to_string()));
        }
        Ok(vec![SeriesPoint {
            timestamp: 1_700_000_000.0,
            value: 42.0,
        }])
    }
}

async fn setup_test_app(events_url: &str) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::POLLER).await;
    health_registry.register(components::BACKEND).await;

    let poller = Poller::new(
        Arc::new(MetricsAggregator::new(Arc::new(FixedSource))),
        QueryBuilder::default(),
        PollerConfig::default(),
    )
    .with_health(health_registry.clone());

    let events = EventsClient::new(events_url, Duration::from_secs(5)).unwrap();
    let state = Arc::new(AppState::new(
        health_registry,
        poller,
        TargetResolver::default(),
        events,
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn put_tree(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/api/v1/tree")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const NO_EVENTS: &str = "http://127.0.0.1:1";

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app(NO_EVENTS).await;

    let (status, health) = send(app, get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app(NO_EVENTS).await;

    state
        .health_registry
        .update(components::POLLER, ComponentHealth::degraded("missing series: cpu"))
        .await;

    let (status, health) = send(app, get("/healthz")).await;

    // Degraded still returns 200 (operational)
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app(NO_EVENTS).await;

    state
        .health_registry
        .set_unhealthy(components::POLLER, "transport error: connection refused")
        .await;

    let (status, health) = send(app, get("/healthz")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state) = setup_test_app(NO_EVENTS).await;

    let (status, readiness) = send(app, get("/readyz")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state) = setup_test_app(NO_EVENTS).await;

    state.health_registry.set_ready(true).await;

    let (status, readiness) = send(app, get("/readyz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_readyz_returns_503_when_backend_unreachable() {
    let (app, state) = setup_test_app(NO_EVENTS).await;

    state.health_registry.set_ready(true).await;
    state
        .health_registry
        .set_unhealthy(components::BACKEND, "backend not ready after 4 attempts")
        .await;

    let (status, readiness) = send(app, get("/readyz")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app(NO_EVENTS).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));
}

#[tokio::test(start_paused = true)]
async fn test_put_tree_starts_polling() {
    let (app, state) = setup_test_app(NO_EVENTS).await;

    let (status, body) = send(
        app,
        put_tree(serde_json::json!({
            "nodes": [
                {"kind": "Service", "name": "web-svc", "namespace": "shop"},
                {"kind": "Deployment", "name": "web", "namespace": "shop"},
                {"kind": "ReplicaSet", "name": "web-7d9f", "namespace": "shop"}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target"]["name"], "web");
    assert_eq!(body["target"]["namespace"], "shop");

    tokio::time::sleep(Duration::from_secs(1)).await;

    let (status, snapshot) = send(create_router(state.clone()), get("/api/v1/metrics")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["target"]["name"], "web");
    assert_eq!(snapshot["result"]["status"]["loading"], false);
    assert_eq!(snapshot["result"]["series"]["cpu"][0]["value"], 42.0);
    assert_eq!(
        snapshot["result"]["series"]["disk_write"],
        serde_json::json!([])
    );
    assert_eq!(
        snapshot["result"]["status"]["diagnostics"][0]["key"],
        "disk_write"
    );

    let health = state.health_registry.health().await;
    assert_eq!(health.status, panel_lib::ComponentStatus::Degraded);
}

#[tokio::test(start_paused = true)]
async fn test_put_tree_without_workload_stops_polling() {
    let (app, state) = setup_test_app(NO_EVENTS).await;

    send(
        app,
        put_tree(serde_json::json!({
            "nodes": [{"kind": "Deployment", "name": "web"}],
            "default_namespace": "shop"
        })),
    )
    .await;
    assert!(state.poller.lock().await.is_running());

    let (status, body) = send(
        create_router(state.clone()),
        put_tree(serde_json::json!({"nodes": [{"kind": "Service", "name": "web"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["target"].is_null());
    assert!(!state.poller.lock().await.is_running());

    let (_, snapshot) = send(create_router(state.clone()), get("/api/v1/metrics")).await;
    assert!(snapshot["target"].is_null());
    assert_eq!(snapshot["result"]["status"]["loading"], false);
}

#[tokio::test]
async fn test_put_tree_rejects_malformed_body() {
    let (app, _state) = setup_test_app(NO_EVENTS).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/tree")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"nodes": "nope"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_events_returns_recent_for_app() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v1/namespaces/shop/events")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"items":[
                {"type":"Normal","reason":"Pulled","involvedObject":{"kind":"Pod","name":"web-1"},"lastTimestamp":"2024-05-01T10:00:00Z"},
                {"type":"Warning","reason":"BackOff","involvedObject":{"kind":"Pod","name":"web-2"},"lastTimestamp":"2024-05-01T11:00:00Z"},
                {"type":"Normal","reason":"Pulled","involvedObject":{"kind":"Pod","name":"db-0"},"lastTimestamp":"2024-05-01T12:00:00Z"}
            ]}"#,
        )
        .create_async()
        .await;

    let (app, _state) = setup_test_app(&server.url()).await;
    let (status, events) = send(app, get("/api/v1/events?app=web&namespace=shop")).await;

    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["reason"], "BackOff");
    assert_eq!(events[1]["reason"], "Pulled");
}

#[tokio::test]
async fn test_events_upstream_failure_returns_502() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v1/namespaces/default/events")
        .with_status(500)
        .create_async()
        .await;

    let (app, _state) = setup_test_app(&server.url()).await;
    let (status, body) = send(app, get("/api/v1/events?app=web")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "transport");
}

#[tokio::test]
async fn test_events_rejects_invalid_namespace() {
    let mut server = mockito::Server::new_async().await;
    let outside = server
        .mock("GET", "/api/v1/secrets/events")
        .with_status(200)
        .with_body(r#"{"items":[]}"#)
        .expect(0)
        .create_async()
        .await;

    let (app, _state) = setup_test_app(&server.url()).await;
    let (status, body) = send(app, get("/api/v1/events?app=web&namespace=../secrets")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
    outside.assert_async().await;
}
