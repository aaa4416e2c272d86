use anyhow::Result;
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use tracing::debug;

/// Creates a Kubernetes client from the in-cluster service account, or from
/// the local kubeconfig when running outside the cluster.
pub async fn build_kube_client() -> Result<Client> {
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");
    Ok(client)
}

/// Namespaced API for `K`, or a cluster-wide one when no namespace is given.
pub fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}
