use std::sync::Arc;
use async_trait::async_trait;

use crate::core::state::runtime::ingress::ingress_runtime_state::IngressRuntimeState;

#[async_trait]
pub trait IngressRuntimeStateRepositoryTrait: Send + Sync {
    /// Return the current snapshot without cloning it.
    async fn get(&self) -> Arc<IngressRuntimeState>;

    /// Mutate the internal state using a closure.
    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut IngressRuntimeState) + Send + Sync;
}
