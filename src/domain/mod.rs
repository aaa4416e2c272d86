pub mod ingress;
pub mod manifest;
