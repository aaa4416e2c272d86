use anyhow::Result;
use kube::api::ListParams;
use kube::Client;
use tracing::debug;

use crate::core::client::kube_client::scoped_api;
use crate::core::client::kube_resources::Service;

/// Fetch services in one namespace, or across the cluster when `namespace` is None
pub async fn fetch_services(client: &Client, namespace: Option<&str>) -> Result<Vec<Service>> {
    let services = scoped_api::<Service>(client, namespace);
    let svc_list = services.list(&ListParams::default()).await?;

    debug!(
        "Discovered {} service(s) in {}",
        svc_list.items.len(),
        namespace.unwrap_or("all namespaces")
    );
    Ok(svc_list.items)
}
