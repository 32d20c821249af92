//! Recent Kubernetes events for an application

use anyhow::Result;
use colored::Colorize;
use panel_lib::{EventsClient, KubeEvent};
use std::time::Duration;
use tabled::Tabled;

use crate::output::{color_status, print_json, print_warning, OutputFormat};

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Last Seen")]
    last_seen: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Object")]
    object: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&KubeEvent> for EventRow {
    fn from(event: &KubeEvent) -> Self {
        Self {
            last_seen: event
                .timestamp()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
            event_type: color_status(&event.event_type),
            reason: event.reason.clone(),
            object: format!(
                "{}/{}",
                event.involved_object.kind, event.involved_object.name
            ),
            message: event.message.clone().unwrap_or_default(),
        }
    }
}

/// Show the most recent events for an application
pub async fn show_events(
    kube_api_url: &str,
    app: &str,
    namespace: &str,
    limit: usize,
    timeout: Duration,
    format: OutputFormat,
) -> Result<()> {
    let client = EventsClient::new(kube_api_url, timeout)?;
    let events = client.recent(namespace, app, limit).await?;

    match format {
        OutputFormat::Json => print_json(&events)?,
        OutputFormat::Table => {
            println!("{}", "Recent Events".bold());
            println!("{}", "=".repeat(60));
            println!("Application: {}", app.cyan());
            println!("Namespace:   {}", namespace.cyan());
            println!();

            if events.is_empty() {
                print_warning("No events found for this application");
                return Ok(());
            }

            let warnings = events.iter().filter(|e| e.is_warning()).count();
            let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} events ({} warnings)", events.len(), warnings);
        }
    }

    Ok(())
}
