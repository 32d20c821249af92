//! One-shot metrics collection for a workload

use anyhow::Result;
use colored::Colorize;
use panel_lib::{
    CycleOutcome, MetricsAggregator, MetricsResult, PrometheusClient, QueryBuilder, TimeWindow,
    WorkloadTarget,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tabled::Tabled;

use crate::output::{
    color_status, format_metric_value, print_error, print_json, print_warning, OutputFormat,
};

/// Row for the series summary table
#[derive(Tabled, Serialize)]
pub struct SeriesRow {
    #[tabled(rename = "Metric")]
    pub key: String,
    #[tabled(rename = "Points")]
    pub points: usize,
    #[tabled(rename = "Latest")]
    pub latest: String,
    #[tabled(rename = "Min")]
    pub min: String,
    #[tabled(rename = "Max")]
    pub max: String,
}

/// Summarize every series in key order; empty series show `-`
pub fn summarize(result: &MetricsResult) -> Vec<SeriesRow> {
    result
        .series
        .iter()
        .map(|(key, series)| {
            let fmt = |v: Option<f64>| {
                v.map(|v| format_metric_value(*key, v))
                    .unwrap_or_else(|| "-".to_string())
            };
            let min = series.iter().map(|p| p.value).reduce(f64::min);
            let max = series.iter().map(|p| p.value).reduce(f64::max);

            SeriesRow {
                key: key.to_string(),
                points: series.len(),
                latest: fmt(result.latest(*key)),
                min: fmt(min),
                max: fmt(max),
            }
        })
        .collect()
}

/// Print a result as a summary table plus its status
pub fn print_result(target: &WorkloadTarget, result: &MetricsResult) {
    println!("{}", "Workload Metrics".bold());
    println!("{}", "=".repeat(60));
    println!("Workload:   {}", target.to_string().cyan());
    println!("Outcome:    {}", color_status(result.outcome().as_str()));
    println!();

    if let Some(error) = &result.status.error {
        print_error(error);
        return;
    }

    if result.status.loading {
        print_warning("First cycle still loading");
        return;
    }

    let table = tabled::Table::new(summarize(result))
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);

    for diagnostic in &result.status.diagnostics {
        print_warning(&format!(
            "{}: {} ({})",
            diagnostic.key,
            diagnostic.message,
            diagnostic.kind.as_str()
        ));
    }
}

/// Run one aggregation cycle against Prometheus and print it
pub async fn show_metrics(
    prometheus_url: &str,
    target: WorkloadTarget,
    lookback: Duration,
    step: Duration,
    timeout: Duration,
    format: OutputFormat,
) -> Result<()> {
    let client = PrometheusClient::new(prometheus_url, timeout)?;
    let aggregator = MetricsAggregator::new(Arc::new(client));

    let queries = QueryBuilder::default().build_for(&target);
    let window = TimeWindow::ending_now(lookback, step);
    let result = aggregator.collect(&queries, &window).await;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_result(&target, &result),
    }

    if result.outcome() == CycleOutcome::Failed {
        anyhow::bail!("No series could be fetched for {}", target);
    }

    Ok(())
}
