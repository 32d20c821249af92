//! Output formatting utilities

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use panel_lib::MetricKey;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    if bytes >= GB {
        format!("{:.2}Gi", bytes / GB)
    } else if bytes >= MB {
        format!("{:.2}Mi", bytes / MB)
    } else if bytes >= KB {
        format!("{:.2}Ki", bytes / KB)
    } else {
        format!("{:.0}B", bytes)
    }
}

/// Format CPU cores, switching to millicores below one core
pub fn format_cpu(cores: f64) -> String {
    if cores >= 1.0 {
        format!("{:.2}", cores)
    } else {
        format!("{:.0}m", cores * 1000.0)
    }
}

/// Format a sample value in the unit of its metric
pub fn format_metric_value(key: MetricKey, value: f64) -> String {
    match key {
        MetricKey::Cpu => format_cpu(value),
        MetricKey::Memory => format_bytes(value),
        MetricKey::NetworkRx | MetricKey::NetworkTx | MetricKey::DiskWrite => {
            format!("{}/s", format_bytes(value))
        }
    }
}

/// Format Unix seconds as a UTC timestamp
pub fn format_unix(timestamp: f64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp.trunc() as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "ok" | "healthy" | "normal" => status.green().to_string(),
        "partial" | "degraded" | "warning" | "loading" => status.yellow().to_string(),
        "failed" | "unhealthy" | "error" => status.red().to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512.0), "512B");
        assert_eq!(format_bytes(2048.0), "2.00Ki");
        assert_eq!(format_bytes(256.0 * 1024.0 * 1024.0), "256.00Mi");
        assert_eq!(format_bytes(1.5 * 1024.0 * 1024.0 * 1024.0), "1.50Gi");
    }

    #[test]
    fn test_format_metric_value() {
        assert_eq!(format_metric_value(MetricKey::Cpu, 0.25), "250m");
        assert_eq!(format_metric_value(MetricKey::Cpu, 2.0), "2.00");
        assert_eq!(format_metric_value(MetricKey::NetworkRx, 4096.0), "4.00Ki/s");
    }

    #[test]
    fn test_format_unix() {
        assert_eq!(format_unix(1_700_000_000.5), "2023-11-14 22:13:20");
    }
}
