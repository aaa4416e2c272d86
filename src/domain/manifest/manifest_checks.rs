use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use serde::Serialize;

use crate::core::client::kube_resources::{Deployment, Service};
use crate::domain::ingress::annotation::{auto_ingress_path, validate_path};
use crate::domain::manifest::manifest_loader::Manifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIssue {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: {}", self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestReport {
    pub documents: usize,
    pub issues: Vec<ManifestIssue>,
}

impl ManifestReport {
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    fn error(&mut self, message: String) {
        self.issues.push(ManifestIssue {
            severity: Severity::Error,
            message,
        });
    }

    fn warning(&mut self, message: String) {
        self.issues.push(ManifestIssue {
            severity: Severity::Warning,
            message,
        });
    }
}

/// Static consistency checks across the Deployments and Services of a manifest.
pub fn check_manifest(manifest: &Manifest, annotation_key: &str) -> ManifestReport {
    let mut report = ManifestReport {
        documents: manifest.documents.len(),
        ..Default::default()
    };

    if manifest.documents.is_empty() {
        report.error("manifest contains no documents".to_string());
        return report;
    }

    for deployment in manifest.deployments() {
        check_deployment(deployment, &mut report);
    }

    for service in manifest.services() {
        check_service(service, manifest, annotation_key, &mut report);
    }

    report
}

pub fn template_labels(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.metadata.as_ref())
        .and_then(|meta| meta.labels.clone())
        .unwrap_or_default()
}

pub fn selector_labels(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.selector.match_labels.clone())
        .unwrap_or_default()
}

pub fn service_selector(service: &Service) -> BTreeMap<String, String> {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.selector.clone())
        .unwrap_or_default()
}

/// Container ports of the pod template as `(name, number)` pairs.
pub fn container_ports(deployment: &Deployment) -> Vec<(Option<String>, i32)> {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .map(|pod| {
            pod.containers
                .iter()
                .flat_map(|c| c.ports.iter().flatten())
                .map(|p| (p.name.clone(), p.container_port))
                .collect()
        })
        .unwrap_or_default()
}

fn check_deployment(deployment: &Deployment, report: &mut ManifestReport) {
    let name = deployment.name_any();
    let selector = selector_labels(deployment);
    let labels = template_labels(deployment);

    if selector.is_empty() {
        report.error(format!("Deployment '{name}' has an empty selector.matchLabels"));
    } else if selector != labels {
        report.error(format!(
            "Deployment '{name}' selector.matchLabels {selector:?} does not match template labels {labels:?}"
        ));
    }

    if let Some(replicas) = deployment.spec.as_ref().and_then(|s| s.replicas) {
        if replicas < 0 {
            report.error(format!("Deployment '{name}' has negative replicas ({replicas})"));
        }
    }

    let Some(pod) = deployment.spec.as_ref().and_then(|s| s.template.spec.as_ref()) else {
        report.error(format!("Deployment '{name}' has no pod template spec"));
        return;
    };

    for volume in pod.volumes.iter().flatten() {
        let mounted = pod
            .containers
            .iter()
            .flat_map(|c| c.volume_mounts.iter().flatten())
            .any(|m| m.name == volume.name);
        if !mounted {
            report.warning(format!(
                "Deployment '{name}' declares volume '{}' that no container mounts",
                volume.name
            ));
        }
    }
}

fn check_service(service: &Service, manifest: &Manifest, annotation_key: &str, report: &mut ManifestReport) {
    let name = service.name_any();
    let selector = service_selector(service);

    if let Some(path) = auto_ingress_path(service, annotation_key) {
        if let Err(e) = validate_path(&path) {
            report.error(format!("Service '{name}' annotation '{annotation_key}': {e}"));
        }
    }

    if selector.is_empty() {
        report.warning(format!("Service '{name}' has no selector; skipping backend checks"));
        return;
    }

    let targets: Vec<&Deployment> = manifest
        .deployments()
        .filter(|d| {
            let labels = template_labels(d);
            selector.iter().all(|(k, v)| labels.get(k) == Some(v))
        })
        .collect();

    if targets.is_empty() {
        report.error(format!("Service '{name}' selector {selector:?} matches no Deployment in the manifest"));
        return;
    }

    let ports = service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.clone())
        .unwrap_or_default();

    if ports.is_empty() {
        report.error(format!("Service '{name}' defines no ports"));
    }

    for deployment in targets {
        let deployment_name = deployment.name_any();
        let labels = template_labels(deployment);
        if labels != selector {
            report.warning(format!(
                "Service '{name}' selector {selector:?} is a subset of Deployment '{deployment_name}' labels {labels:?}"
            ));
        }

        let exposed = container_ports(deployment);
        for port in &ports {
            let target = port
                .target_port
                .clone()
                .unwrap_or(IntOrString::Int(port.port));
            let matched = match &target {
                IntOrString::Int(n) => exposed.iter().any(|(_, p)| p == n),
                IntOrString::String(s) => exposed.iter().any(|(n, _)| n.as_deref() == Some(s.as_str())),
            };
            if !matched {
                let shown = match &target {
                    IntOrString::Int(n) => n.to_string(),
                    IntOrString::String(s) => s.clone(),
                };
                report.error(format!(
                    "Service '{name}' targetPort {shown} is not a containerPort of Deployment '{deployment_name}'"
                ));
            }
        }
    }
}
