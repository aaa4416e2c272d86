use k8s_openapi::api::core::v1::Service;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("path '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("path '{0}' must not contain whitespace")]
    ContainsWhitespace(String),
}

/// Returns the requested Ingress path, or `None` when the annotation is missing
/// or empty.
pub fn auto_ingress_path(service: &Service, key: &str) -> Option<String> {
    service
        .metadata
        .annotations
        .as_ref()?
        .get(key)
        .filter(|value| !value.is_empty())
        .cloned()
}

pub fn validate_path(path: &str) -> Result<(), AnnotationError> {
    if !path.starts_with('/') {
        return Err(AnnotationError::NotAbsolute(path.to_string()));
    }
    if path.chars().any(char::is_whitespace) {
        return Err(AnnotationError::ContainsWhitespace(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn service_with(annotations: Option<&[(&str, &str)]>) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("my-service".into()),
                annotations: annotations.map(|pairs| {
                    pairs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_reads_annotation() {
        let svc = service_with(Some(&[("auto-ingress", "/aaa")]));
        assert_eq!(auto_ingress_path(&svc, "auto-ingress").as_deref(), Some("/aaa"));
    }

    #[test]
    fn test_missing_or_empty_annotation_is_absent() {
        assert_eq!(auto_ingress_path(&service_with(None), "auto-ingress"), None);
        assert_eq!(
            auto_ingress_path(&service_with(Some(&[("other", "/x")])), "auto-ingress"),
            None
        );
        assert_eq!(
            auto_ingress_path(&service_with(Some(&[("auto-ingress", "")])), "auto-ingress"),
            None
        );
    }

    #[test]
    fn test_custom_key() {
        let svc = service_with(Some(&[("example.com/expose", "/api")]));
        assert_eq!(auto_ingress_path(&svc, "example.com/expose").as_deref(), Some("/api"));
        assert_eq!(auto_ingress_path(&svc, "auto-ingress"), None);
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("/").is_ok());
        assert!(validate_path("/aaa/bbb").is_ok());
        assert_eq!(
            validate_path("aaa"),
            Err(AnnotationError::NotAbsolute("aaa".into()))
        );
        assert_eq!(
            validate_path("/a b"),
            Err(AnnotationError::ContainsWhitespace("/a b".into()))
        );
    }
}
