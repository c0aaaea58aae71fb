use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use kube::{
    Api, Client,
    api::{DeleteParams, ListParams},
    config::{InClusterError, KubeConfigOptions, Kubeconfig, KubeconfigError},
};

use super::{ClusterResult, JobDeleter, JobLister};
use crate::config::ClusterConfig;

/// Errors building the Kubernetes client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to load in-cluster configuration: {0}")]
    InCluster(#[from] InClusterError),

    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] KubeconfigError),

    #[error("Failed to create Kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// [`JobLister`] and [`JobDeleter`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeJobClient {
    client: Client,
}

impl KubeJobClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the cluster section of the configuration.
    ///
    /// In-cluster mode reads the service account token mounted into the pod.
    /// Otherwise the kubeconfig at `config.kubeconfig` is used, falling back to
    /// the standard resolution (`$KUBECONFIG`, then `~/.kube/config`).
    pub async fn from_config(config: &ClusterConfig) -> Result<Self, ClientError> {
        let kube_config = if config.in_cluster {
            tracing::debug!("Using in-cluster Kubernetes configuration");
            kube::Config::incluster()?
        } else {
            let options = KubeConfigOptions {
                context: config.context.clone(),
                ..Default::default()
            };
            match &config.kubeconfig {
                Some(path) => {
                    tracing::debug!(kubeconfig = %path.display(), "Loading kubeconfig");
                    let kubeconfig = Kubeconfig::read_from(path)?;
                    kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?
                }
                None => {
                    tracing::debug!("Loading kubeconfig from default location");
                    kube::Config::from_kubeconfig(&options).await?
                }
            }
        };

        let client = Client::try_from(kube_config)?;
        Ok(Self::new(client))
    }

    fn jobs(&self, namespace: &str) -> Api<Job> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl JobLister for KubeJobClient {
    async fn list_jobs(&self, namespace: &str, label_selector: &str) -> ClusterResult<Vec<Job>> {
        let list = self
            .jobs(namespace)
            .list(&list_params(label_selector))
            .await?;
        tracing::debug!(
            namespace,
            label_selector,
            count = list.items.len(),
            "Listed jobs"
        );
        Ok(list.items)
    }
}

#[async_trait]
impl JobDeleter for KubeJobClient {
    async fn delete_job(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        self.jobs(namespace).delete(name, &delete_params()).await?;
        Ok(())
    }
}

/// An empty selector lists every Job in the namespace.
fn list_params(label_selector: &str) -> ListParams {
    let params = ListParams::default();
    if label_selector.is_empty() {
        params
    } else {
        params.labels(label_selector)
    }
}

/// Foreground propagation removes the Job's pods before the Job itself.
fn delete_params() -> DeleteParams {
    DeleteParams::foreground()
}
