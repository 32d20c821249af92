//! Agent configuration

use anyhow::{Context, Result};
use panel_lib::poller::PollerConfig;
use serde::Deserialize;
use std::time::Duration;

/// Agent configuration, read from `PANEL_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Instance name used in structured logs
    #[serde(default = "default_instance")]
    pub instance: String,

    /// API server port for the panel, health and metrics routes
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Prometheus HTTP API root, including `/api/v1`
    #[serde(default = "default_prometheus_url")]
    pub prometheus_url: String,

    /// Kubernetes API root (or `kubectl proxy` address) for events
    #[serde(default = "default_kube_api_url")]
    pub kube_api_url: String,

    /// Resource kind treated as the primary workload
    #[serde(default = "default_workload_kind")]
    pub workload_kind: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_lookback")]
    pub lookback_secs: u64,

    #[serde(default = "default_step")]
    pub step_secs: u64,

    /// Window of the `rate()` calls in counter queries
    #[serde(default = "default_rate_window")]
    pub rate_window_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long startup waits for Prometheus before arming the poller
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "panel-agent".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_prometheus_url() -> String {
    "http://localhost:9090/api/v1".to_string()
}

fn default_kube_api_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_workload_kind() -> String {
    panel_lib::discovery::DEFAULT_WORKLOAD_KIND.to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_lookback() -> u64 {
    3600
}

fn default_step() -> u64 {
    60
}

fn default_rate_window() -> u64 {
    120
}

fn default_request_timeout() -> u64 {
    10
}

fn default_ready_timeout() -> u64 {
    30
}

impl AgentConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let source = config::Config::builder()
            .add_source(config::Environment::with_prefix("PANEL").try_parsing(true))
            .build()
            .context("Failed to read agent configuration")?;

        Self::from_config(source)
    }

    pub fn from_config(source: config::Config) -> Result<Self> {
        let config: AgentConfig = source
            .try_deserialize()
            .context("Invalid agent configuration")?;

        anyhow::ensure!(config.poll_interval_secs > 0, "poll_interval_secs must be positive");
        Ok(config)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            lookback: Duration::from_secs(self.lookback_secs),
            step: Duration::from_secs(self.step_secs),
        }
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}
