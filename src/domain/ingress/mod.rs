//! Service → Ingress mapping: annotation parsing, desired-state building and
//! the create/replace/delete decision.

pub mod annotation;
pub mod ingress_builder;
pub mod ingress_planner;
pub mod service;

/// Settings that shape every generated Ingress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressSettings {
    pub annotation_key: String,
    pub entrypoints: String,
    pub ingress_class: Option<String>,
}

impl Default for IngressSettings {
    fn default() -> Self {
        Self {
            annotation_key: crate::config::DEFAULT_ANNOTATION_KEY.to_string(),
            entrypoints: crate::config::DEFAULT_ENTRYPOINTS.to_string(),
            ingress_class: None,
        }
    }
}
