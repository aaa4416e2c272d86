use async_trait::async_trait;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

use crate::core::client::kube_resources::Ingress;
use crate::errors::ReconcileError;

/// Namespaced Ingress CRUD used by the reconciler.
#[async_trait]
pub trait IngressStore: Send + Sync {
    /// `None` when the Ingress does not exist.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Ingress>, ReconcileError>;

    async fn create(&self, namespace: &str, ingress: &Ingress) -> Result<Ingress, ReconcileError>;

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        ingress: &Ingress,
    ) -> Result<Ingress, ReconcileError>;

    /// `Ok(false)` when the Ingress was already gone.
    async fn delete(&self, namespace: &str, name: &str) -> Result<bool, ReconcileError>;
}

/// `IngressStore` backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeIngressStore {
    client: Client,
}

impl KubeIngressStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Ingress> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl IngressStore for KubeIngressStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Ingress>, ReconcileError> {
        let ingress = self.api(namespace).get_opt(name).await?;
        debug!("Fetched ingress {}/{}: found={}", namespace, name, ingress.is_some());
        Ok(ingress)
    }

    async fn create(&self, namespace: &str, ingress: &Ingress) -> Result<Ingress, ReconcileError> {
        let created = self
            .api(namespace)
            .create(&PostParams::default(), ingress)
            .await?;
        Ok(created)
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        ingress: &Ingress,
    ) -> Result<Ingress, ReconcileError> {
        let replaced = self
            .api(namespace)
            .replace(name, &PostParams::default(), ingress)
            .await?;
        Ok(replaced)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<bool, ReconcileError> {
        match self.api(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
