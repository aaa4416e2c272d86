use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatusDto {
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub watch_scope: String,
    pub annotation_key: String,

    /// Services with a runtime record (annotated now or recently)
    pub tracked_services: usize,
    pub active_ingresses: usize,

    pub reconcile_count: u64,
    pub error_count: u64,
    pub last_reconciled_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
}
