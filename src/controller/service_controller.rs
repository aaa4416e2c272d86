//! Watch loop driving Service reconciliation.
//!
//! Create, update and startup listing of a Service all end up in
//! [`reconcile`]; changes to an owned Ingress re-trigger its Service, so
//! manual edits to a managed Ingress are reverted on the next pass.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::reflector::{ObjectRef, Store};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use tracing::{debug, info, warn};

use crate::config::OperatorConfig;
use crate::core::client::ingresses::KubeIngressStore;
use crate::core::client::kube_client::scoped_api;
use crate::core::client::kube_resources::{Ingress, Service};
use crate::core::client::watchers::watch_service_deletions;
use crate::core::state::runtime::ingress::ingress_runtime_state_manager::IngressRuntimeStateManager;
use crate::core::state::runtime::ingress::ingress_runtime_state_repository::IngressRuntimeStateRepository;
use crate::core::state::runtime::ingress::ingress_runtime_state_repository_trait::IngressRuntimeStateRepositoryTrait;
use crate::domain::ingress::ingress_builder::managed_by_selector;
use crate::domain::ingress::service::ingress_reconcile_service::reconcile_service;
use crate::domain::ingress::IngressSettings;
use crate::errors::ReconcileError;

const CONFLICT_REQUEUE: Duration = Duration::from_secs(1);

pub type SharedIngressState = Arc<IngressRuntimeStateManager<IngressRuntimeStateRepository>>;

/// Shared data handed to every reconcile call.
pub struct ControllerContext {
    pub store: KubeIngressStore,
    pub settings: IngressSettings,
    pub state: SharedIngressState,
    /// The controller's own view of live Services.
    pub services: Store<Service>,
    pub resync: Duration,
    pub error_requeue: Duration,
}

pub async fn reconcile(
    service: Arc<Service>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileError> {
    let outcome = reconcile_service(&service, &ctx.store, &ctx.settings, ctx.state.as_ref()).await;
    discard_if_deleted(&ctx.services, &service, ctx.state.as_ref()).await;
    let outcome = outcome?;
    debug!(
        service = %service.name_any(),
        namespace = %service.namespace().unwrap_or_default(),
        ?outcome,
        "Reconciled service"
    );
    Ok(Action::requeue(ctx.resync))
}

pub fn error_policy(
    service: Arc<Service>,
    error: &ReconcileError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let retry_in = retry_delay(error, ctx.error_requeue);

    warn!(
        service = %service.name_any(),
        namespace = %service.namespace().unwrap_or_default(),
        error = %error,
        "Failed to reconcile service, retrying in {:?}",
        retry_in
    );
    Action::requeue(retry_in)
}

/// A reconcile still in flight when its Service is deleted would otherwise
/// write the record back after the deletion watcher dropped it.
async fn discard_if_deleted<R>(
    services: &Store<Service>,
    service: &Service,
    state: &IngressRuntimeStateManager<R>,
) -> bool
where
    R: IngressRuntimeStateRepositoryTrait,
{
    if services.get(&ObjectRef::from_obj(service)).is_some() {
        return false;
    }
    let namespace = service.namespace().unwrap_or_else(|| "default".to_string());
    let name = service.name_any();
    debug!("Service {}/{} is gone; dropping its record", namespace, name);
    state.forget(&namespace, &name).await;
    true
}

/// A 409 means the Ingress changed underneath us; re-read it right away.
fn retry_delay(error: &ReconcileError, error_requeue: Duration) -> Duration {
    if error.is_conflict() {
        CONFLICT_REQUEUE
    } else {
        error_requeue
    }
}

/// Runs the Service controller until a shutdown signal arrives.
pub async fn run_service_controller(
    client: Client,
    config: &OperatorConfig,
    state: SharedIngressState,
) -> Result<()> {
    let namespace = config.watch_namespace.as_deref();
    let services = scoped_api::<Service>(&client, namespace);
    let ingresses = scoped_api::<Ingress>(&client, namespace);

    let controller = Controller::new(services, watcher::Config::default())
        .owns(ingresses, watcher::Config::default().labels(&managed_by_selector()));

    let ctx = Arc::new(ControllerContext {
        store: KubeIngressStore::new(client.clone()),
        settings: config.ingress_settings(),
        state,
        services: controller.store(),
        resync: config.resync_interval(),
        error_requeue: config.error_requeue_interval(),
    });

    info!(
        "Starting Service controller (scope: {}, annotation: '{}')",
        config.watch_scope(),
        config.annotation_key
    );

    controller
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, action)) => debug!(%object, ?action, "Service reconciliation completed"),
                Err(e) => warn!(error = %e, "Service reconciliation error"),
            }
        })
        .await;

    info!("Service controller stopped");
    Ok(())
}

/// Logs Service deletions and drops their runtime records. The managed Ingress
/// is removed by Kubernetes garbage collection through its owner reference.
pub async fn run_deletion_watcher(
    client: Client,
    config: &OperatorConfig,
    state: SharedIngressState,
) -> Result<()> {
    let services = scoped_api::<Service>(&client, config.watch_namespace.as_deref());

    watch_service_deletions(services, |service| {
        let state = state.clone();
        async move {
            let namespace = service.namespace().unwrap_or_default();
            let name = service.name_any();
            info!(
                "Service {}/{} deleted. Corresponding Ingress (if any) will be garbage-collected.",
                namespace, name
            );
            state.forget(&namespace, &name).await;
            Ok(())
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::ingress::ingress_runtime_state::IngressAction;
    use crate::domain::ingress::ingress_builder::tests::{port, service};
    use crate::errors::tests::api_error;
    use kube::runtime::reflector;

    fn state() -> IngressRuntimeStateManager<IngressRuntimeStateRepository> {
        IngressRuntimeStateManager::new(IngressRuntimeStateRepository::new().shared())
    }

    async fn seed(state: &IngressRuntimeStateManager<IngressRuntimeStateRepository>) {
        state
            .record(
                "default",
                "my-service",
                "auto-ingress-my-service-http",
                IngressAction::Created,
                Some("/aaa".into()),
                Some("http".into()),
                None,
            )
            .await;
    }

    #[test]
    fn test_conflict_retries_quickly() {
        let fallback = Duration::from_secs(30);
        assert_eq!(retry_delay(&api_error(409, "Conflict"), fallback), Duration::from_secs(1));
        assert_eq!(retry_delay(&api_error(500, "InternalError"), fallback), fallback);
        assert_eq!(
            retry_delay(&ReconcileError::Store("down".into()), fallback),
            fallback
        );
    }

    #[tokio::test]
    async fn test_record_of_deleted_service_is_discarded() {
        let (services, _writer) = reflector::store::<Service>();
        let state = state();
        let svc = service("my-service", Some("uid-1"), Some(vec![port(Some("http"), 80)]));
        seed(&state).await;

        assert!(discard_if_deleted(&services, &svc, &state).await);
        assert!(state.get("default", "my-service").await.is_none());
    }

    #[tokio::test]
    async fn test_record_of_live_service_is_kept() {
        let (services, mut writer) = reflector::store::<Service>();
        let state = state();
        let svc = service("my-service", Some("uid-1"), Some(vec![port(Some("http"), 80)]));
        writer.apply_watcher_event(&watcher::Event::Apply(svc.clone()));
        seed(&state).await;

        assert!(!discard_if_deleted(&services, &svc, &state).await);
        assert!(state.get("default", "my-service").await.is_some());
    }
}
