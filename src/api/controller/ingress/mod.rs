use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::dto::ingress_dto::IngressListQuery;
use crate::api::dto::ApiResponse;
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::core::state::runtime::ingress::ingress_runtime_state::IngressRecord;
use crate::errors::AppError;

pub struct IngressController;

impl IngressController {
    pub async fn list(
        State(state): State<AppState>,
        Query(query): Query<IngressListQuery>,
    ) -> Result<Json<ApiResponse<Vec<IngressRecord>>>, AppError> {
        if query.namespace.as_deref().is_some_and(|ns| ns.trim().is_empty()) {
            return Err(AppError::BadRequest("namespace filter must not be empty".into()));
        }
        to_json(state.ingress_service.list(query.namespace).await)
    }

    pub async fn get(
        State(state): State<AppState>,
        Path((namespace, service)): Path<(String, String)>,
    ) -> Result<Json<ApiResponse<IngressRecord>>, AppError> {
        state
            .ingress_service
            .get(&namespace, &service)
            .await
            .map(|record| Json(ApiResponse::ok(record)))
            .ok_or_else(|| AppError::NotFound(format!("no managed ingress for service {namespace}/{service}")))
    }
}
