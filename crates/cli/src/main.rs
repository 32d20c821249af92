//! Workload Panels CLI
//!
//! A command-line tool for previewing panel queries, resolving workload
//! targets, fetching metrics and events, and inspecting a running agent.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{events, metrics, parse_duration, status, target};
use panel_lib::{discovery::DEFAULT_WORKLOAD_KIND, events::DEFAULT_EVENT_LIMIT, WorkloadTarget};
use std::path::PathBuf;
use std::time::Duration;

/// Workload Panels CLI
#[derive(Parser)]
#[command(name = "pnl")]
#[command(author, version, about = "CLI for Workload Panels", long_about = None)]
pub struct Cli {
    /// Prometheus API root (can also be set via PNL_PROMETHEUS_URL env var)
    #[arg(long, env = "PNL_PROMETHEUS_URL", global = true)]
    pub prometheus_url: Option<String>,

    /// Kubernetes API root, e.g. a `kubectl proxy` address
    #[arg(long, env = "PNL_KUBE_API_URL", global = true)]
    pub kube_api_url: Option<String>,

    /// Panel agent endpoint
    #[arg(long, env = "PNL_AGENT_URL", global = true)]
    pub agent_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout: u64,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the range queries issued for a workload
    Queries {
        /// Workload name
        workload: String,

        /// Workload namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Window of rate() in counter queries (e.g. 2m)
        #[arg(long, default_value = "2m")]
        rate_window: String,
    },

    /// Resolve the primary workload from a saved resource tree
    Resolve {
        /// JSON file with the tree's nodes
        #[arg(long)]
        tree: PathBuf,

        /// Namespace for nodes that carry none
        #[arg(long)]
        default_namespace: Option<String>,

        /// Resource kind treated as the workload
        #[arg(long, default_value = DEFAULT_WORKLOAD_KIND)]
        kind: String,
    },

    /// Fetch every panel series once and summarize it
    Metrics {
        /// Workload name
        workload: String,

        /// Workload namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// How far back to query (e.g. 30m, 1h, 1d)
        #[arg(long, default_value = "1h")]
        lookback: String,

        /// Query resolution (e.g. 60, 5m)
        #[arg(long, default_value = "60s")]
        step: String,
    },

    /// Show recent events for an application
    Events {
        /// Application name; events for objects starting with it are shown
        app: String,

        /// Application namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Maximum number of events
        #[arg(long, default_value_t = DEFAULT_EVENT_LIMIT)]
        limit: usize,
    },

    /// Show the current snapshot of a running panel agent
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load_or_default();
    let timeout = Duration::from_secs(cli.timeout);

    let result = match cli.command {
        Commands::Queries {
            workload,
            namespace,
            rate_window,
        } => {
            let namespace = config.namespace(namespace.as_deref());
            let rate_window = parse_duration(&rate_window)?;
            target::show_queries(&workload, &namespace, rate_window, cli.format)
        }
        Commands::Resolve {
            tree,
            default_namespace,
            kind,
        } => target::resolve_target(
            &tree,
            &kind,
            default_namespace
                .as_deref()
                .or(config.default_namespace.as_deref()),
            cli.format,
        ),
        Commands::Metrics {
            workload,
            namespace,
            lookback,
            step,
        } => {
            let workload = WorkloadTarget::new(workload, config.namespace(namespace.as_deref()));
            metrics::show_metrics(
                &config.prometheus_url(cli.prometheus_url.as_deref()),
                workload,
                parse_duration(&lookback)?,
                parse_duration(&step)?,
                timeout,
                cli.format,
            )
            .await
        }
        Commands::Events {
            app,
            namespace,
            limit,
        } => {
            events::show_events(
                &config.kube_api_url(cli.kube_api_url.as_deref()),
                &app,
                &config.namespace(namespace.as_deref()),
                limit,
                timeout,
                cli.format,
            )
            .await
        }
        Commands::Status => {
            let client =
                client::ApiClient::new(&config.agent_url(cli.agent_url.as_deref()), timeout)?;
            status::show_status(&client, cli.format).await
        }
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
