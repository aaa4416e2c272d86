use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last thing the operator did for a Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngressAction {
    Created,
    Updated,
    Unchanged,
    Deleted,
    Skipped,
    Failed,
}

/// What the operator knows about one annotated Service and its Ingress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressRecord {
    pub namespace: String,
    pub service: String,
    pub ingress_name: String,

    /// Annotation value at the last reconcile (None once removed)
    pub path: Option<String>,

    /// Backend port name or number, rendered as a string
    pub backend_port: Option<String>,

    pub last_action: IngressAction,

    /// Skip reason or error message for the last action
    pub message: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl IngressRecord {
    pub fn key(&self) -> String {
        record_key(&self.namespace, &self.service)
    }
}

pub fn record_key(namespace: &str, service: &str) -> String {
    format!("{namespace}/{service}")
}

/// In-memory snapshot of everything the operator has reconciled.
///
/// Lives only in memory; it is rebuilt from the cluster on every start because
/// the controller reconciles all Services when it begins watching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngressRuntimeState {
    /// `namespace/service` → record
    pub records: BTreeMap<String, IngressRecord>,

    pub reconcile_count: u64,
    pub error_count: u64,

    pub last_reconciled_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
}

impl IngressRuntimeState {
    pub fn upsert(&mut self, record: IngressRecord) {
        self.reconcile_count += 1;
        self.last_reconciled_at = Some(record.updated_at);
        if record.last_action == IngressAction::Failed {
            self.error_count += 1;
            self.last_error_at = Some(record.updated_at);
            self.last_error_message = record.message.clone();
        }
        self.records.insert(record.key(), record);
    }

    pub fn remove(&mut self, namespace: &str, service: &str) -> Option<IngressRecord> {
        self.records.remove(&record_key(namespace, service))
    }

    /// Number of Services that currently have a live managed Ingress.
    pub fn active_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| {
                matches!(
                    r.last_action,
                    IngressAction::Created | IngressAction::Updated | IngressAction::Unchanged
                )
            })
            .count()
    }
}
