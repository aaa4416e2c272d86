use std::sync::Arc;
use chrono::Utc;

use crate::core::state::runtime::ingress::ingress_runtime_state::{
    record_key, IngressAction, IngressRecord, IngressRuntimeState,
};
use crate::core::state::runtime::ingress::ingress_runtime_state_repository_trait::IngressRuntimeStateRepositoryTrait;

pub struct IngressRuntimeStateManager<R: IngressRuntimeStateRepositoryTrait> {
    pub(crate) repo: Arc<R>,
}

impl<R: IngressRuntimeStateRepositoryTrait> IngressRuntimeStateManager<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn snapshot(&self) -> Arc<IngressRuntimeState> {
        self.repo.get().await
    }

    /// Store the outcome of one reconcile, stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        namespace: &str,
        service: &str,
        ingress_name: &str,
        action: IngressAction,
        path: Option<String>,
        backend_port: Option<String>,
        message: Option<String>,
    ) {
        let record = IngressRecord {
            namespace: namespace.to_string(),
            service: service.to_string(),
            ingress_name: ingress_name.to_string(),
            path,
            backend_port,
            last_action: action,
            message,
            updated_at: Utc::now(),
        };
        self.repo.update(move |state| state.upsert(record)).await;
    }

    /// Record a failed reconcile, keeping the path/port seen last time.
    pub async fn record_error(
        &self,
        namespace: &str,
        service: &str,
        ingress_name: &str,
        message: String,
    ) {
        let previous = self.get(namespace, service).await;
        self.record(
            namespace,
            service,
            ingress_name,
            IngressAction::Failed,
            previous.as_ref().and_then(|r| r.path.clone()),
            previous.and_then(|r| r.backend_port),
            Some(message),
        )
        .await;
    }

    /// Drop the record of a Service that no longer exists or is no longer annotated.
    pub async fn forget(&self, namespace: &str, service: &str) {
        let (namespace, service) = (namespace.to_string(), service.to_string());
        self.repo
            .update(move |state| {
                state.remove(&namespace, &service);
            })
            .await;
    }

    pub async fn get(&self, namespace: &str, service: &str) -> Option<IngressRecord> {
        self.repo
            .get()
            .await
            .records
            .get(&record_key(namespace, service))
            .cloned()
    }

    /// All records, optionally limited to one namespace, ordered by key.
    pub async fn list(&self, namespace: Option<&str>) -> Vec<IngressRecord> {
        self.repo
            .get()
            .await
            .records
            .values()
            .filter(|r| namespace.map_or(true, |ns| r.namespace == ns))
            .cloned()
            .collect()
    }
}
