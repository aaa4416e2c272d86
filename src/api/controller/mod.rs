pub mod ingress;
pub mod system;
