use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};
use serde::Serialize;
use thiserror::Error;

use crate::domain::ingress::IngressSettings;
use crate::errors::ReconcileError;

pub const ENTRYPOINTS_ANNOTATION: &str = "traefik.ingress.kubernetes.io/router.entrypoints";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "auto-ingress-operator";
pub const PATH_TYPE_PREFIX: &str = "Prefix";

/// Name of the Ingress managed for `service_name`.
pub fn ingress_name_for(service_name: &str) -> String {
    format!("auto-ingress-{service_name}-http")
}

/// Label selector matching every Ingress this operator manages.
pub fn managed_by_selector() -> String {
    format!("{MANAGED_BY_LABEL}={MANAGED_BY_VALUE}")
}

/// The Service port an Ingress backend points at. A named port is preferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BackendPort {
    Name(String),
    Number(i32),
}

impl BackendPort {
    fn to_service_backend_port(&self) -> ServiceBackendPort {
        match self {
            BackendPort::Name(name) => ServiceBackendPort {
                name: Some(name.clone()),
                number: None,
            },
            BackendPort::Number(number) => ServiceBackendPort {
                name: None,
                number: Some(*number),
            },
        }
    }
}

impl fmt::Display for BackendPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendPort::Name(name) => write!(f, "{name}"),
            BackendPort::Number(number) => write!(f, "{number}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortSelectionError {
    #[error("service has no ports defined")]
    NoPorts,

    #[error("first service port has neither a name nor a port number")]
    Incomplete,
}

/// Picks the backend port from the first entry of `spec.ports`.
pub fn select_backend_port(service: &Service) -> Result<BackendPort, PortSelectionError> {
    let first = service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_ref())
        .and_then(|ports| ports.first())
        .ok_or(PortSelectionError::NoPorts)?;

    match (first.name.as_deref(), first.port) {
        (Some(name), _) if !name.is_empty() => Ok(BackendPort::Name(name.to_string())),
        (_, number) if number > 0 => Ok(BackendPort::Number(number)),
        _ => Err(PortSelectionError::Incomplete),
    }
}

/// Builds the desired Ingress for `service`, routing `path` (Prefix match) to
/// `port`. The Ingress is controlled by the Service so it is garbage-collected
/// together with it.
pub fn build_ingress(
    service: &Service,
    path: &str,
    port: &BackendPort,
    settings: &IngressSettings,
) -> Result<Ingress, ReconcileError> {
    let service_name = service
        .metadata
        .name
        .clone()
        .ok_or(ReconcileError::MissingMetadata("name"))?;

    let owner = service
        .controller_owner_ref(&())
        .map(|owner| OwnerReference {
            controller: Some(true),
            block_owner_deletion: Some(true),
            ..owner
        })
        .ok_or(ReconcileError::MissingMetadata("uid"))?;

    let annotations = BTreeMap::from([(
        ENTRYPOINTS_ANNOTATION.to_string(),
        settings.entrypoints.clone(),
    )]);
    let labels = BTreeMap::from([(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string())]);

    let http_path = HTTPIngressPath {
        path: Some(path.to_string()),
        path_type: PATH_TYPE_PREFIX.to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: service_name.clone(),
                port: Some(port.to_service_backend_port()),
            }),
            ..Default::default()
        },
    };

    Ok(Ingress {
        metadata: ObjectMeta {
            name: Some(ingress_name_for(&service_name)),
            namespace: service.namespace(),
            annotations: Some(annotations),
            labels: Some(labels),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: settings.ingress_class.clone(),
            rules: Some(vec![IngressRule {
                host: None,
                http: Some(HTTPIngressRuleValue {
                    paths: vec![http_path],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// True when `ingress` carries a controller owner reference to the Service
/// with `service_uid`.
pub fn is_controlled_by(ingress: &Ingress, service_uid: &str) -> bool {
    ingress
        .owner_references()
        .iter()
        .any(|owner| owner.controller == Some(true) && owner.uid == service_uid)
}
