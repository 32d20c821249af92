//! Configuration management for the CLI

use anyhow::{Context, Result};
use colored::Colorize;
use panel_lib::discovery::FALLBACK_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090/api/v1";
pub const DEFAULT_KUBE_API_URL: &str = "http://localhost:8001";
pub const DEFAULT_AGENT_URL: &str = "http://localhost:8080";

/// CLI configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Prometheus HTTP API root
    pub prometheus_url: Option<String>,
    /// Kubernetes API root (or `kubectl proxy` address)
    pub kube_api_url: Option<String>,
    /// Panel agent endpoint
    pub agent_url: Option<String>,
    /// Namespace used when a command is given none
    pub default_namespace: Option<String>,
}

impl Config {
    /// Load configuration from the default location, if present
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration, falling back to built-in defaults when the file
    /// cannot be located or read. The warning goes to stderr so JSON output
    /// stays parseable.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            eprintln!("{} {:#}; using defaults", "⚠".yellow().bold(), e);
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("pnl").join("config.json"))
    }

    pub fn prometheus_url(&self, flag: Option<&str>) -> String {
        pick(flag, self.prometheus_url.as_deref(), DEFAULT_PROMETHEUS_URL)
    }

    pub fn kube_api_url(&self, flag: Option<&str>) -> String {
        pick(flag, self.kube_api_url.as_deref(), DEFAULT_KUBE_API_URL)
    }

    pub fn agent_url(&self, flag: Option<&str>) -> String {
        pick(flag, self.agent_url.as_deref(), DEFAULT_AGENT_URL)
    }

    pub fn namespace(&self, flag: Option<&str>) -> String {
        pick(flag, self.default_namespace.as_deref(), FALLBACK_NAMESPACE)
    }
}

/// Flag (or env), then config file, then built-in default. Empty values
/// count as unset.
fn pick(flag: Option<&str>, file: Option<&str>, default: &str) -> String {
    flag.filter(|v| !v.is_empty())
        .or(file.filter(|v| !v.is_empty()))
        .unwrap_or(default)
        .to_string()
}
