//! Lifecycle shared by the vector store backends

use tokio::sync::RwLock;

use crate::domain::knowledge_base::KnowledgeBaseName;
use crate::domain::DomainError;

#[derive(Debug)]
enum Lifecycle<C> {
    Uninitialized,
    Ready(C),
    Dropped,
}

/// Holds the backend client once `do_init` has built it.
///
/// A dropped backend refuses every operation until it is initialized again.
#[derive(Debug)]
pub(crate) struct BackendState<C> {
    inner: RwLock<Lifecycle<C>>,
}

impl<C: Clone> BackendState<C> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Lifecycle::Uninitialized),
        }
    }

    /// Client of a usable backend
    pub async fn client(&self, kb_name: &KnowledgeBaseName) -> Result<C, DomainError> {
        match &*self.inner.read().await {
            Lifecycle::Ready(client) => Ok(client.clone()),
            Lifecycle::Uninitialized => Err(DomainError::knowledge_base(format!(
                "knowledge base '{}' is not initialized",
                kb_name
            ))),
            Lifecycle::Dropped => Err(DomainError::knowledge_base(format!(
                "knowledge base '{}' has been dropped",
                kb_name
            ))),
        }
    }

    pub async fn is_ready(&self) -> bool {
        matches!(&*self.inner.read().await, Lifecycle::Ready(_))
    }

    pub async fn set_ready(&self, client: C) {
        *self.inner.write().await = Lifecycle::Ready(client);
    }

    pub async fn set_dropped(&self) {
        *self.inner.write().await = Lifecycle::Dropped;
    }
}
