//! Orchestrator client capabilities.
//!
//! The retention run only needs two things from the cluster: enumerate the
//! Jobs matching a label selector, and delete one Job together with its
//! dependents. Both are expressed as narrow traits so the run can be driven
//! by the real Kubernetes client or by an in-memory double in tests.

mod kube_client;

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;

pub use kube_client::{ClientError, KubeJobClient};

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Failure from an implementation not backed by the Kubernetes API.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;

/// Lists Jobs in a namespace.
#[async_trait]
pub trait JobLister: Send + Sync {
    /// Return every Job in `namespace` matching `label_selector`.
    ///
    /// An empty selector matches all Jobs.
    async fn list_jobs(&self, namespace: &str, label_selector: &str) -> ClusterResult<Vec<Job>>;
}

/// Deletes a single Job.
#[async_trait]
pub trait JobDeleter: Send + Sync {
    /// Delete the Job and its dependents (foreground cascade).
    async fn delete_job(&self, namespace: &str, name: &str) -> ClusterResult<()>;
}
