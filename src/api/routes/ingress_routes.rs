//! Managed ingress inspection routes (/api/v1/ingresses/*)

use axum::{routing::get, Router};
use crate::api::controller::ingress::IngressController;
use crate::app_state::AppState;

pub fn ingress_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(IngressController::list))
        .route("/{namespace}/{service}", get(IngressController::get))
}
