use anyhow::Result;
use kube::{Client, ResourceExt};
use tracing::{info, warn};

use crate::config::OperatorConfig;
use crate::core::client::ingresses::{IngressStore, KubeIngressStore};
use crate::core::client::services::fetch_services;
use crate::domain::ingress::ingress_builder::ingress_name_for;
use crate::domain::ingress::ingress_planner::{plan_ingress, IngressPlan};

/// Dry run: plans every Service in scope and logs what would change. Nothing is
/// written to the cluster. Runs for the `dry-run` command or when
/// AUTO_INGRESS_DEBUG_MODE is set.
pub async fn run_debug(client: &Client, config: &OperatorConfig) -> Result<()> {
    info!("🔧 Debug mode: planning ingresses for {}...", config.watch_scope());

    let settings = config.ingress_settings();
    let store = KubeIngressStore::new(client.clone());
    let services = fetch_services(client, config.watch_namespace.as_deref()).await?;

    let mut pending = 0usize;
    for service in &services {
        let namespace = service.namespace().unwrap_or_default();
        let name = service.name_any();
        let ingress_name = ingress_name_for(&name);

        let existing = match store.get(&namespace, &ingress_name).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!("Could not read Ingress {}/{}: {}", namespace, ingress_name, e);
                continue;
            }
        };

        match plan_ingress(service, existing.as_ref(), &settings) {
            Ok(IngressPlan::Ignore) => {}
            Ok(IngressPlan::Unchanged { path, .. }) => {
                info!("{}/{}: up to date ({} -> {})", namespace, name, path, ingress_name);
            }
            Ok(IngressPlan::Create { path, port, .. }) => {
                pending += 1;
                info!("{}/{}: would CREATE {} ({} -> port {})", namespace, name, ingress_name, path, port);
            }
            Ok(IngressPlan::Replace { path, port, .. }) => {
                pending += 1;
                info!("{}/{}: would UPDATE {} ({} -> port {})", namespace, name, ingress_name, path, port);
            }
            Ok(IngressPlan::Delete { name: ingress }) => {
                pending += 1;
                info!("{}/{}: would DELETE {}", namespace, name, ingress);
            }
            Ok(IngressPlan::Skip { path, reason }) => {
                warn!("{}/{}: would SKIP path '{}': {}", namespace, name, path, reason);
            }
            Err(e) => warn!("{}/{}: cannot plan: {}", namespace, name, e),
        }
    }

    info!(
        "Debug tasks completed: {} service(s) inspected, {} change(s) pending. Exiting...",
        services.len(),
        pending
    );
    Ok(())
}
