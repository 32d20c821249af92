//! Workload discovery from an application's resource tree

use crate::models::{ResourceNode, WorkloadTarget};
use tracing::debug;

/// Kind looked up when none is configured
pub const DEFAULT_WORKLOAD_KIND: &str = "Deployment";

/// Namespace used when neither the node nor the application names one
pub const FALLBACK_NAMESPACE: &str = "default";

/// Resolves the workload a panel tracks from a resource-tree snapshot
#[derive(Debug, Clone)]
pub struct TargetResolver {
    kind: String,
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new(DEFAULT_WORKLOAD_KIND)
    }
}

impl TargetResolver {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// First node of the configured kind, in snapshot order.
    ///
    /// Namespace comes from the node, then `default_namespace`, then
    /// [`FALLBACK_NAMESPACE`]. Empty strings count as absent.
    pub fn resolve(
        &self,
        nodes: &[ResourceNode],
        default_namespace: Option<&str>,
    ) -> Option<WorkloadTarget> {
        let node = nodes.iter().find(|node| node.kind == self.kind)?;

        let namespace = non_empty(&node.namespace)
            .or_else(|| default_namespace.and_then(non_empty))
            .unwrap_or(FALLBACK_NAMESPACE);

        debug!(
            kind = %self.kind,
            name = %node.name,
            namespace = %namespace,
            "Resolved workload target"
        );

        Some(WorkloadTarget::new(node.name.clone(), namespace))
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: &str, name: &str, namespace: &str) -> ResourceNode {
        ResourceNode {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    #[test]
    fn test_resolve_deployment() {
        let nodes = vec![node("Deployment", "web", "prod")];
        let target = TargetResolver::default()
            .resolve(&nodes, Some("default"))
            .unwrap();

        assert_eq!(target, WorkloadTarget::new("web", "prod"));
    }

    #[test]
    fn test_resolve_no_match() {
        let nodes = vec![
            node("Service", "web", "prod"),
            node("ConfigMap", "web-config", "prod"),
        ];
        assert!(TargetResolver::default().resolve(&nodes, None).is_none());
        assert!(TargetResolver::default().resolve(&[], Some("prod")).is_none());
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let nodes = vec![
            node("Service", "svc", "prod"),
            node("Deployment", "api", "prod"),
            node("Deployment", "worker", "prod"),
        ];
        let target = TargetResolver::default().resolve(&nodes, None).unwrap();
        assert_eq!(target.name, "api");
    }

    #[test]
    fn test_resolve_namespace_fallbacks() {
        let resolver = TargetResolver::default();
        let nodes = vec![node("Deployment", "web", "")];

        let target = resolver.resolve(&nodes, Some("staging")).unwrap();
        assert_eq!(target.namespace, "staging");

        let target = resolver.resolve(&nodes, Some("")).unwrap();
        assert_eq!(target.namespace, "default");

        let target = resolver.resolve(&nodes, None).unwrap();
        assert_eq!(target.namespace, "default");
    }

    #[test]
    fn test_resolve_custom_kind() {
        let nodes = vec![
            node("Deployment", "web", "prod"),
            node("StatefulSet", "db", "data"),
        ];
        let target = TargetResolver::new("StatefulSet")
            .resolve(&nodes, None)
            .unwrap();
        assert_eq!(target, WorkloadTarget::new("db", "data"));
    }

    #[test]
    fn test_kind_match_is_exact() {
        let nodes = vec![node("deployment", "web", "prod")];
        assert!(TargetResolver::default().resolve(&nodes, None).is_none());
    }
}
