use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which cluster to talk to and which Jobs to consider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// Namespace the Jobs live in.
    /// Default: "default"
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Label selector the Jobs must match (e.g. "app=report,tier!=dev").
    /// Empty matches every Job in the namespace.
    #[serde(default)]
    pub label_selector: String,

    /// Use the service account mounted into the pod.
    /// Default: true
    #[serde(default = "default_in_cluster")]
    pub in_cluster: bool,

    /// Path to a kubeconfig file, used when `in_cluster` is false.
    /// If omitted, `$KUBECONFIG` or `~/.kube/config` is used.
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current context.
    #[serde(default)]
    pub context: Option<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            label_selector: String::new(),
            in_cluster: default_in_cluster(),
            kubeconfig: None,
            context: None,
        }
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_in_cluster() -> bool {
    true
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.trim().is_empty() {
            return Err("cluster.namespace must not be empty".into());
        }
        if self.in_cluster && (self.kubeconfig.is_some() || self.context.is_some()) {
            tracing::warn!(
                "cluster.kubeconfig and cluster.context are ignored when cluster.in_cluster is true"
            );
        }
        Ok(())
    }
}
