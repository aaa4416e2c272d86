//! Re-exports of the Kubernetes resource types the operator works with.

pub use k8s_openapi::api::apps::v1::Deployment;
pub use k8s_openapi::api::core::v1::Service;
pub use k8s_openapi::api::networking::v1::Ingress;
