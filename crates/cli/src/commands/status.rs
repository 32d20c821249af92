//! Panel status from a running agent

use anyhow::Result;

use crate::client::{AgentSnapshot, ApiClient};
use crate::commands::metrics::print_result;
use crate::output::{print_info, print_json, OutputFormat};

/// Show the agent's current target and metrics snapshot
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let snapshot: AgentSnapshot = client.get("api/v1/metrics").await?;

    match format {
        OutputFormat::Json => print_json(&snapshot)?,
        OutputFormat::Table => match &snapshot.target {
            Some(target) => print_result(target, &snapshot.result),
            None => print_info("Agent has no workload target"),
        },
    }

    Ok(())
}
