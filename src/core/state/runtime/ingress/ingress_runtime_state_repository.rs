use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::state::runtime::ingress::ingress_runtime_state::IngressRuntimeState;
use crate::core::state::runtime::ingress::ingress_runtime_state_repository_trait::IngressRuntimeStateRepositoryTrait;

pub struct IngressRuntimeStateRepository {
    state: Arc<RwLock<Arc<IngressRuntimeState>>>,
}

impl IngressRuntimeStateRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Arc::new(IngressRuntimeState::default()))),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for IngressRuntimeStateRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IngressRuntimeStateRepositoryTrait for IngressRuntimeStateRepository {
    async fn get(&self) -> Arc<IngressRuntimeState> {
        self.state.read().await.clone()
    }

    /// Copy-on-write: readers holding the old Arc keep a consistent snapshot.
    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut IngressRuntimeState) + Send + Sync,
    {
        let mut guard = self.state.write().await;
        let mut new_state = (**guard).clone();
        f(&mut new_state);
        *guard = Arc::new(new_state);
    }
}
