//! API route declarations (e.g., /api/v1/*)

pub mod ingress_routes;
pub mod system_routes;
