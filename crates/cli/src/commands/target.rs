//! Query preview and target resolution commands

use anyhow::{Context, Result};
use colored::Colorize;
use panel_lib::{QueryBuilder, ResourceNode, TargetResolver};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tabled::Tabled;

use crate::output::{print_json, print_warning, OutputFormat};

#[derive(Tabled, Serialize)]
struct QueryRow {
    #[tabled(rename = "Metric")]
    key: String,
    #[tabled(rename = "Query")]
    query: String,
}

/// A saved resource tree: either a bare node list or `{"nodes": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum TreeFile {
    Nodes(Vec<ResourceNode>),
    Wrapped { nodes: Vec<ResourceNode> },
}

impl TreeFile {
    fn into_nodes(self) -> Vec<ResourceNode> {
        match self {
            TreeFile::Nodes(nodes) | TreeFile::Wrapped { nodes } => nodes,
        }
    }
}

/// Print the range queries issued for a workload
pub fn show_queries(
    workload: &str,
    namespace: &str,
    rate_window: Duration,
    format: OutputFormat,
) -> Result<()> {
    let queries = QueryBuilder::new(rate_window).build(namespace, workload);

    let rows: Vec<QueryRow> = queries
        .iter()
        .map(|(key, query)| QueryRow {
            key: key.to_string(),
            query: query.to_string(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => {
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

pub fn load_tree(path: &Path) -> Result<Vec<ResourceNode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree file {}", path.display()))?;
    let tree: TreeFile = serde_json::from_str(&content).context("Failed to parse tree file")?;
    Ok(tree.into_nodes())
}

/// Resolve the primary workload from a saved resource tree
pub fn resolve_target(
    tree: &Path,
    kind: &str,
    default_namespace: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let nodes = load_tree(tree)?;
    let target = TargetResolver::new(kind).resolve(&nodes, default_namespace);

    match format {
        OutputFormat::Json => print_json(&target)?,
        OutputFormat::Table => match target {
            Some(target) => {
                println!("Kind:       {}", kind.cyan());
                println!("Name:       {}", target.name.cyan());
                println!("Namespace:  {}", target.namespace.cyan());
            }
            None => print_warning(&format!(
                "No {} found among {} nodes",
                kind,
                nodes.len()
            )),
        },
    }

    Ok(())
}
