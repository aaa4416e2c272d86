use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP API.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Helper for mapping any unknown error into internal error
pub fn internal_error<E: ToString>(err: E) -> AppError {
    AppError::InternalServerError(err.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}

/// Errors returned from a single Service reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Service is missing metadata.{0}")]
    MissingMetadata(&'static str),

    #[error("Ingress store error: {0}")]
    Store(String),
}

impl ReconcileError {
    /// 409 on replace means someone else wrote the Ingress first.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ReconcileError::Kube(kube::Error::Api(e)) if e.code == 409)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::InternalServerError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_reconcile_error_messages() {
        assert_eq!(
            ReconcileError::MissingMetadata("uid").to_string(),
            "Service is missing metadata.uid"
        );
        assert!(!ReconcileError::Store("down".into()).is_conflict());
    }

    pub(crate) fn api_error(code: u16, reason: &str) -> ReconcileError {
        ReconcileError::Kube(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".into(),
            message: format!("operation failed: {reason}"),
            reason: reason.into(),
            code,
        }))
    }

    #[test]
    fn test_conflict_detection() {
        assert!(api_error(409, "Conflict").is_conflict());
        assert!(!api_error(404, "NotFound").is_conflict());
        assert!(!api_error(500, "InternalError").is_conflict());
    }
}
