use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::api::dto::system_dto::SystemStatusDto;
use crate::config::OperatorConfig;
use crate::controller::service_controller::SharedIngressState;
use crate::core::state::runtime::ingress::ingress_runtime_state::IngressRecord;

#[derive(Clone)]
pub struct AppState {
    pub system_service: Arc<SystemService>,
    pub ingress_service: Arc<IngressQueryService>,
}

pub fn build_app_state(config: &OperatorConfig, ingress_state: SharedIngressState) -> AppState {
    AppState {
        system_service: Arc::new(SystemService {
            started_at: Utc::now(),
            watch_scope: config.watch_scope(),
            annotation_key: config.annotation_key.clone(),
            ingress_state: ingress_state.clone(),
        }),
        ingress_service: Arc::new(IngressQueryService {
            state: ingress_state,
        }),
    }
}

pub struct SystemService {
    started_at: DateTime<Utc>,
    watch_scope: String,
    annotation_key: String,
    ingress_state: SharedIngressState,
}

impl SystemService {
    pub async fn status(&self) -> Result<SystemStatusDto> {
        let snapshot = self.ingress_state.snapshot().await;
        Ok(SystemStatusDto {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: self.started_at,
            watch_scope: self.watch_scope.clone(),
            annotation_key: self.annotation_key.clone(),
            tracked_services: snapshot.records.len(),
            active_ingresses: snapshot.active_count(),
            reconcile_count: snapshot.reconcile_count,
            error_count: snapshot.error_count,
            last_reconciled_at: snapshot.last_reconciled_at,
            last_error_at: snapshot.last_error_at,
            last_error_message: snapshot.last_error_message.clone(),
        })
    }
}

pub struct IngressQueryService {
    state: SharedIngressState,
}

impl IngressQueryService {
    pub async fn list(&self, namespace: Option<String>) -> Result<Vec<IngressRecord>> {
        Ok(self.state.list(namespace.as_deref()).await)
    }

    pub async fn get(&self, namespace: &str, service: &str) -> Option<IngressRecord> {
        self.state.get(namespace, service).await
    }
}
