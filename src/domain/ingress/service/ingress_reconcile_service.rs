use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::client::ingresses::IngressStore;
use crate::core::state::runtime::ingress::ingress_runtime_state::IngressAction;
use crate::core::state::runtime::ingress::ingress_runtime_state_manager::IngressRuntimeStateManager;
use crate::core::state::runtime::ingress::ingress_runtime_state_repository_trait::IngressRuntimeStateRepositoryTrait;
use crate::domain::ingress::ingress_builder::ingress_name_for;
use crate::domain::ingress::ingress_planner::{plan_ingress, IngressPlan};
use crate::domain::ingress::IngressSettings;
use crate::errors::ReconcileError;

/// Result of reconciling one Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Created(String),
    Updated(String),
    Unchanged(String),
    Deleted(String),
    /// Annotation removed but the Ingress was already gone.
    AlreadyDeleted(String),
    Skipped(String),
    Ignored,
}

/// Brings the managed Ingress of `service` in line with its annotation and
/// records the result in the runtime state.
pub async fn reconcile_service<S, R>(
    service: &Service,
    store: &S,
    settings: &IngressSettings,
    state: &IngressRuntimeStateManager<R>,
) -> Result<ReconcileOutcome, ReconcileError>
where
    S: IngressStore + ?Sized,
    R: IngressRuntimeStateRepositoryTrait,
{
    let namespace = service.namespace().unwrap_or_else(|| "default".to_string());
    let name = service
        .metadata
        .name
        .clone()
        .ok_or(ReconcileError::MissingMetadata("name"))?;
    let ingress_name = ingress_name_for(&name);

    info!("Processing service {}/{}", namespace, name);

    match apply_plan(service, store, settings, state, &namespace, &name, &ingress_name).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            state
                .record_error(&namespace, &name, &ingress_name, e.to_string())
                .await;
            Err(e)
        }
    }
}

async fn apply_plan<S, R>(
    service: &Service,
    store: &S,
    settings: &IngressSettings,
    state: &IngressRuntimeStateManager<R>,
    namespace: &str,
    name: &str,
    ingress_name: &str,
) -> Result<ReconcileOutcome, ReconcileError>
where
    S: IngressStore + ?Sized,
    R: IngressRuntimeStateRepositoryTrait,
{
    let existing = store.get(namespace, ingress_name).await?;

    match plan_ingress(service, existing.as_ref(), settings)? {
        IngressPlan::Create { ingress, path, port } => {
            info!(
                "Creating Ingress {} in namespace {} with path '{}' pointing to service port '{}'",
                ingress_name, namespace, path, port
            );
            store.create(namespace, &ingress).await?;
            state
                .record(namespace, name, ingress_name, IngressAction::Created, Some(path), Some(port.to_string()), None)
                .await;
            Ok(ReconcileOutcome::Created(ingress_name.to_string()))
        }
        IngressPlan::Replace { ingress, path, port } => {
            info!(
                "Ingress {} already exists. Updating path '{}' -> service port '{}'",
                ingress_name, path, port
            );
            store.replace(namespace, ingress_name, &ingress).await?;
            state
                .record(namespace, name, ingress_name, IngressAction::Updated, Some(path), Some(port.to_string()), None)
                .await;
            Ok(ReconcileOutcome::Updated(ingress_name.to_string()))
        }
        IngressPlan::Unchanged { path, port } => {
            debug!("Ingress {}/{} is up to date", namespace, ingress_name);
            state
                .record(namespace, name, ingress_name, IngressAction::Unchanged, Some(path), Some(port.to_string()), None)
                .await;
            Ok(ReconcileOutcome::Unchanged(ingress_name.to_string()))
        }
        IngressPlan::Delete { name: ingress_to_delete } => {
            info!(
                "'{}' annotation was removed from {}/{}. Deleting Ingress {}.",
                settings.annotation_key, namespace, name, ingress_to_delete
            );
            let deleted = store.delete(namespace, &ingress_to_delete).await?;
            if deleted {
                info!("Successfully deleted Ingress {}.", ingress_to_delete);
            } else {
                info!("Ingress {} already deleted.", ingress_to_delete);
            }
            state
                .record(namespace, name, ingress_name, IngressAction::Deleted, None, None, None)
                .await;
            Ok(if deleted {
                ReconcileOutcome::Deleted(ingress_to_delete)
            } else {
                ReconcileOutcome::AlreadyDeleted(ingress_to_delete)
            })
        }
        IngressPlan::Skip { path, reason } => {
            warn!(
                "Service {}/{} requests path '{}' but no Ingress will be written: {}",
                namespace, name, path, reason
            );
            state
                .record(namespace, name, ingress_name, IngressAction::Skipped, Some(path), None, Some(reason.to_string()))
                .await;
            Ok(ReconcileOutcome::Skipped(reason.to_string()))
        }
        IngressPlan::Ignore => {
            debug!(
                "No '{}' annotation on {}/{}; nothing to do",
                settings.annotation_key, namespace, name
            );
            state.forget(namespace, name).await;
            Ok(ReconcileOutcome::Ignored)
        }
    }
}
