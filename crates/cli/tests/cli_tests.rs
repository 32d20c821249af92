//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};

fn pnl(args: &[&str]) -> Output {
    pnl_with_home(args, &std::env::temp_dir())
}

fn pnl_with_home(args: &[&str], home: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pnl"))
        .args(args)
        .env("HOME", home)
        .env_remove("PNL_PROMETHEUS_URL")
        .env_remove("PNL_KUBE_API_URL")
        .env_remove("PNL_AGENT_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = pnl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Workload Panels"), "Should show app name");
    assert!(stdout.contains("queries"), "Should show queries command");
    assert!(stdout.contains("resolve"), "Should show resolve command");
    assert!(stdout.contains("metrics"), "Should show metrics command");
    assert!(stdout.contains("events"), "Should show events command");
    assert!(stdout.contains("status"), "Should show status command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = pnl(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("pnl"), "Should show binary name");
}

#[test]
fn test_metrics_help() {
    let output = pnl(&["metrics", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Metrics help should succeed");
    assert!(stdout.contains("--namespace"), "Should show namespace option");
    assert!(stdout.contains("--lookback"), "Should show lookback option");
    assert!(stdout.contains("--step"), "Should show step option");
    assert!(stdout.contains("--prometheus-url"), "Should show global URL option");
}

#[test]
fn test_events_help() {
    let output = pnl(&["events", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Events help should succeed");
    assert!(stdout.contains("--limit"), "Should show limit option");
}

#[test]
fn test_queries_prints_promql() {
    let output = pnl(&["queries", "web", "-n", "shop", "--format", "json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Queries should succeed offline");

    let rows: serde_json::Value = serde_json::from_str(&stdout).expect("JSON output");
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["key"], "cpu");
    assert!(rows[0]["query"]
        .as_str()
        .unwrap()
        .contains(r#"{namespace="shop",pod=~"web.*"}"#));
}

#[test]
fn test_resolve_from_tree_file() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("tree.json");
    std::fs::write(
        &tree,
        r#"{"nodes": [
            {"kind": "Service", "name": "web-svc", "namespace": "shop"},
            {"kind": "Deployment", "name": "web"}
        ]}"#,
    )
    .unwrap();

    let output = pnl(&[
        "resolve",
        "--tree",
        tree.to_str().unwrap(),
        "--default-namespace",
        "staging",
        "--format",
        "json",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Resolve should succeed");
    let target: serde_json::Value = serde_json::from_str(&stdout).expect("JSON output");
    assert_eq!(target["name"], "web");
    assert_eq!(target["namespace"], "staging");
}

#[test]
fn test_invalid_duration_fails() {
    let output = pnl(&["metrics", "web", "--lookback", "soon"]);

    assert!(!output.status.success(), "Bad duration should fail");
}

#[test]
fn test_malformed_config_falls_back_to_defaults() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".config").join("pnl");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.json"), "{ not json").unwrap();

    let output = pnl_with_home(
        &["queries", "web", "-n", "shop", "--format", "json"],
        home.path(),
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "Offline commands should not need the config file");
    assert!(stderr.contains("using defaults"), "Should warn about the config file");

    let rows: serde_json::Value = serde_json::from_str(&stdout).expect("JSON output");
    assert_eq!(rows.as_array().unwrap().len(), 5);
}
