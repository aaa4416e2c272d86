//! Loading and statically checking workload manifests (Deployment + Service
//! pairs) before they are applied.

pub mod manifest_checks;
pub mod manifest_loader;
