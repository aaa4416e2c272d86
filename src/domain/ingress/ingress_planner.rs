use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use thiserror::Error;

use crate::domain::ingress::annotation::{auto_ingress_path, validate_path, AnnotationError};
use crate::domain::ingress::ingress_builder::{
    build_ingress, ingress_name_for, is_controlled_by, select_backend_port, BackendPort,
    PortSelectionError,
};
use crate::domain::ingress::IngressSettings;
use crate::errors::ReconcileError;

/// Why an annotated Service did not get an Ingress.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("invalid annotation: {0}")]
    InvalidPath(#[from] AnnotationError),

    #[error("{0}")]
    Port(#[from] PortSelectionError),

    #[error("ingress '{0}' exists and is not owned by this service")]
    Conflict(String),
}

/// What the reconciler should do for one Service.
#[derive(Debug, Clone, PartialEq)]
pub enum IngressPlan {
    Create {
        ingress: Box<Ingress>,
        path: String,
        port: BackendPort,
    },
    Replace {
        ingress: Box<Ingress>,
        path: String,
        port: BackendPort,
    },
    /// Desired and existing Ingress already agree.
    Unchanged { path: String, port: BackendPort },
    /// Annotation was removed; the owned Ingress has to go.
    Delete { name: String },
    Skip { path: String, reason: SkipReason },
    /// No annotation and nothing owned: not our business.
    Ignore,
}

/// Decides the action for `service` given the Ingress currently stored under
/// the managed name (if any).
pub fn plan_ingress(
    service: &Service,
    existing: Option<&Ingress>,
    settings: &IngressSettings,
) -> Result<IngressPlan, ReconcileError> {
    let service_name = service
        .metadata
        .name
        .as_deref()
        .ok_or(ReconcileError::MissingMetadata("name"))?;
    let service_uid = service.uid().unwrap_or_default();
    let ingress_name = ingress_name_for(service_name);

    let owned = existing.filter(|ing| !service_uid.is_empty() && is_controlled_by(ing, &service_uid));

    let Some(path) = auto_ingress_path(service, &settings.annotation_key) else {
        return Ok(match owned {
            Some(_) => IngressPlan::Delete { name: ingress_name },
            None => IngressPlan::Ignore,
        });
    };

    if let Err(e) = validate_path(&path) {
        return Ok(IngressPlan::Skip { path, reason: e.into() });
    }

    let port = match select_backend_port(service) {
        Ok(port) => port,
        Err(e) => return Ok(IngressPlan::Skip { path, reason: e.into() }),
    };

    if existing.is_some() && owned.is_none() {
        return Ok(IngressPlan::Skip {
            path,
            reason: SkipReason::Conflict(ingress_name),
        });
    }

    let mut desired = build_ingress(service, &path, &port, settings)?;

    let Some(current) = owned else {
        return Ok(IngressPlan::Create {
            ingress: Box::new(desired),
            path,
            port,
        });
    };

    if settings.ingress_class.is_none() {
        keep_assigned_class(&mut desired, current);
    }

    if is_up_to_date(&desired, current) {
        return Ok(IngressPlan::Unchanged { path, port });
    }

    desired.metadata.resource_version = current.metadata.resource_version.clone();
    Ok(IngressPlan::Replace {
        ingress: Box::new(desired),
        path,
        port,
    })
}

/// Without a configured class the API server's default IngressClass fills
/// `ingressClassName` on create; writing `None` back would undo it.
fn keep_assigned_class(desired: &mut Ingress, current: &Ingress) {
    let assigned = current.spec.as_ref().and_then(|s| s.ingress_class_name.clone());
    if let Some(spec) = desired.spec.as_mut() {
        spec.ingress_class_name = assigned;
    }
}

/// Spec and owners must match exactly; labels and annotations only need to
/// contain ours, since other tooling may add its own.
fn is_up_to_date(desired: &Ingress, current: &Ingress) -> bool {
    let contains_all = |want: &std::collections::BTreeMap<String, String>,
                        have: &std::collections::BTreeMap<String, String>| {
        want.iter().all(|(k, v)| have.get(k) == Some(v))
    };

    desired.spec == current.spec
        && desired.owner_references() == current.owner_references()
        && contains_all(desired.labels(), current.labels())
        && contains_all(desired.annotations(), current.annotations())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingress::ingress_builder::tests::{port, service};
    use crate::domain::ingress::ingress_builder::ENTRYPOINTS_ANNOTATION;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use std::collections::BTreeMap;

    fn annotated(path: Option<&str>) -> Service {
        let mut svc = service("my-service", Some("uid-1"), Some(vec![port(Some("http"), 80)]));
        if let Some(path) = path {
            svc.metadata.annotations =
                Some(BTreeMap::from([("auto-ingress".to_string(), path.to_string())]));
        }
        svc
    }

    fn existing_for(svc: &Service, path: &str) -> Ingress {
        let mut ingress = build_ingress(
            svc,
            path,
            &BackendPort::Name("http".into()),
            &IngressSettings::default(),
        )
        .unwrap();
        ingress.metadata.resource_version = Some("42".into());
        ingress
    }

    #[test]
    fn test_create_when_missing() {
        let svc = annotated(Some("/aaa"));
        let plan = plan_ingress(&svc, None, &IngressSettings::default()).unwrap();
        match plan {
            IngressPlan::Create { ingress, path, port } => {
                assert_eq!(ingress.metadata.name.as_deref(), Some("auto-ingress-my-service-http"));
                assert_eq!(path, "/aaa");
                assert_eq!(port, BackendPort::Name("http".into()));
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn test_unchanged_when_identical() {
        let svc = annotated(Some("/aaa"));
        let existing = existing_for(&svc, "/aaa");
        let plan = plan_ingress(&svc, Some(&existing), &IngressSettings::default()).unwrap();
        assert!(matches!(plan, IngressPlan::Unchanged { .. }));
    }

    #[test]
    fn test_extra_annotations_on_existing_do_not_force_replace() {
        let svc = annotated(Some("/aaa"));
        let mut existing = existing_for(&svc, "/aaa");
        existing
            .annotations_mut()
            .insert("kubectl.kubernetes.io/last-applied-configuration".into(), "{}".into());
        let plan = plan_ingress(&svc, Some(&existing), &IngressSettings::default()).unwrap();
        assert!(matches!(plan, IngressPlan::Unchanged { .. }));
    }

    #[test]
    fn test_replace_when_path_changes_and_keeps_resource_version() {
        let svc = annotated(Some("/bbb"));
        let existing = existing_for(&svc, "/aaa");
        let plan = plan_ingress(&svc, Some(&existing), &IngressSettings::default()).unwrap();
        match plan {
            IngressPlan::Replace { ingress, path, .. } => {
                assert_eq!(path, "/bbb");
                assert_eq!(ingress.metadata.resource_version.as_deref(), Some("42"));
            }
            other => panic!("expected replace, got {other:?}"),
        }
    }

    #[test]
    fn test_defaulted_ingress_class_is_left_alone() {
        let svc = annotated(Some("/aaa"));
        let mut existing = existing_for(&svc, "/aaa");
        existing.spec.as_mut().unwrap().ingress_class_name = Some("traefik".into());

        let plan = plan_ingress(&svc, Some(&existing), &IngressSettings::default()).unwrap();
        assert!(matches!(plan, IngressPlan::Unchanged { .. }), "got {plan:?}");

        // a path change must not clear the assigned class either
        let moved = annotated(Some("/bbb"));
        match plan_ingress(&moved, Some(&existing), &IngressSettings::default()).unwrap() {
            IngressPlan::Replace { ingress, .. } => assert_eq!(
                ingress.spec.unwrap().ingress_class_name.as_deref(),
                Some("traefik")
            ),
            other => panic!("expected replace, got {other:?}"),
        }
    }

    #[test]
    fn test_configured_ingress_class_overrides_existing() {
        let svc = annotated(Some("/aaa"));
        let mut existing = existing_for(&svc, "/aaa");
        existing.spec.as_mut().unwrap().ingress_class_name = Some("nginx".into());
        let settings = IngressSettings {
            ingress_class: Some("traefik".into()),
            ..Default::default()
        };

        match plan_ingress(&svc, Some(&existing), &settings).unwrap() {
            IngressPlan::Replace { ingress, .. } => assert_eq!(
                ingress.spec.unwrap().ingress_class_name.as_deref(),
                Some("traefik")
            ),
            other => panic!("expected replace, got {other:?}"),
        }
    }

    #[test]
    fn test_replace_when_entrypoint_annotation_drifted() {
        let svc = annotated(Some("/aaa"));
        let mut existing = existing_for(&svc, "/aaa");
        existing
            .annotations_mut()
            .insert(ENTRYPOINTS_ANNOTATION.into(), "websecure".into());
        let plan = plan_ingress(&svc, Some(&existing), &IngressSettings::default()).unwrap();
        assert!(matches!(plan, IngressPlan::Replace { .. }));
    }

    #[test]
    fn test_delete_owned_when_annotation_removed() {
        let with = annotated(Some("/aaa"));
        let existing = existing_for(&with, "/aaa");
        let without = annotated(None);
        let plan = plan_ingress(&without, Some(&existing), &IngressSettings::default()).unwrap();
        assert_eq!(
            plan,
            IngressPlan::Delete {
                name: "auto-ingress-my-service-http".into()
            }
        );
    }

    #[test]
    fn test_ignore_without_annotation() {
        let plan = plan_ingress(&annotated(None), None, &IngressSettings::default()).unwrap();
        assert_eq!(plan, IngressPlan::Ignore);
    }

    #[test]
    fn test_foreign_ingress_is_never_touched() {
        let svc = annotated(Some("/aaa"));
        let mut foreign = existing_for(&svc, "/aaa");
        foreign.metadata.owner_references = Some(vec![OwnerReference {
            api_version: "v1".into(),
            kind: "Service".into(),
            name: "someone-else".into(),
            uid: "uid-other".into(),
            controller: Some(true),
            ..Default::default()
        }]);

        let plan = plan_ingress(&svc, Some(&foreign), &IngressSettings::default()).unwrap();
        assert!(matches!(
            plan,
            IngressPlan::Skip {
                reason: SkipReason::Conflict(_),
                ..
            }
        ));

        let plan = plan_ingress(&annotated(None), Some(&foreign), &IngressSettings::default()).unwrap();
        assert_eq!(plan, IngressPlan::Ignore);
    }

    #[test]
    fn test_skip_on_invalid_path() {
        let plan = plan_ingress(&annotated(Some("aaa")), None, &IngressSettings::default()).unwrap();
        assert!(matches!(
            plan,
            IngressPlan::Skip {
                reason: SkipReason::InvalidPath(AnnotationError::NotAbsolute(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_skip_on_missing_ports() {
        let mut svc = service("my-service", Some("uid-1"), None);
        svc.metadata.annotations = Some(BTreeMap::from([("auto-ingress".into(), "/aaa".into())]));
        let plan = plan_ingress(&svc, None, &IngressSettings::default()).unwrap();
        assert_eq!(
            plan,
            IngressPlan::Skip {
                path: "/aaa".into(),
                reason: SkipReason::Port(PortSelectionError::NoPorts),
            }
        );
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let mut svc = annotated(Some("/aaa"));
        svc.metadata.name = None;
        assert!(plan_ingress(&svc, None, &IngressSettings::default()).is_err());
    }
}
