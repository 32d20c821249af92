//! Panel agent - serves workload resource panels
//!
//! Polls Prometheus for the workload resolved from the most recently
//! pushed resource tree and serves the snapshot over HTTP.

use anyhow::Result;
use panel_agent::{api, config::AgentConfig};
use panel_lib::{
    await_ready,
    health::{components, HealthRegistry},
    EventsClient, MetricsAggregator, PanelLogger, Poller, PrometheusClient, QueryBuilder,
    TargetResolver,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Interval between backend readiness probes at startup
const READY_PROBE_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting panel-agent");

    let config = AgentConfig::load()?;
    info!(
        instance = %config.instance,
        prometheus_url = %config.prometheus_url,
        workload_kind = %config.workload_kind,
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::POLLER).await;
    health_registry.register(components::BACKEND).await;

    let logger = PanelLogger::new(&config.instance);
    logger.log_startup(AGENT_VERSION);

    let prometheus = PrometheusClient::new(&config.prometheus_url, config.request_timeout())?;
    let events = EventsClient::new(&config.kube_api_url, config.request_timeout())?;

    // Wait for the backend before serving; an unreachable backend leaves
    // the agent unready but still serving health
    let probe_client = prometheus.clone();
    match await_ready(
        || {
            let client = probe_client.clone();
            async move { client.probe().await }
        },
        config.ready_timeout(),
        READY_PROBE_INTERVAL,
    )
    .await
    {
        Ok(attempts) => {
            info!(attempts, "Prometheus reachable");
            health_registry.set_healthy(components::BACKEND).await;
        }
        Err(e) => {
            warn!(error = %e, "Prometheus not reachable");
            health_registry
                .set_unhealthy(components::BACKEND, e.to_string())
                .await;
        }
    }

    let aggregator = Arc::new(MetricsAggregator::new(Arc::new(prometheus)));
    let poller = Poller::new(
        aggregator,
        QueryBuilder::new(config.rate_window()),
        config.poller_config(),
    )
    .with_health(health_registry.clone())
    .with_logger(logger.clone());

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        poller,
        TargetResolver::new(&config.workload_kind),
        events,
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state.clone()));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server exited"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    logger.log_shutdown("API server failed");
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    logger.log_shutdown("API server task panicked");
                }
            }
        }
    }

    app_state.poller.lock().await.stop();
    info!("Shutting down");

    Ok(())
}
