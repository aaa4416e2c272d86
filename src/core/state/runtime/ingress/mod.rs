pub mod ingress_runtime_state;
pub mod ingress_runtime_state_manager;
pub mod ingress_runtime_state_repository;
pub mod ingress_runtime_state_repository_trait;
