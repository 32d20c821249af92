//! Panel agent: serves one workload panel over HTTP
//!
//! The agent owns a [`panel_lib::Poller`], retargets it whenever a new
//! resource tree is pushed, and exposes the current metrics snapshot,
//! recent events, health and Prometheus metrics.

pub mod api;
pub mod config;
