use async_trait::async_trait;
use tokio::sync::RwLock;

use super::errors::TokenStoreError;
use super::traits::TokenStore;
use super::types::PersistedSession;

/// In-memory token store. Nothing survives the process; used by tests and by
/// applications that manage their own persistence.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<PersistedSession>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<PersistedSession, TokenStoreError> {
        Ok(self.session.read().await.clone())
    }

    async fn set(&self, session: PersistedSession) -> Result<(), TokenStoreError> {
        *self.session.write().await = session;
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.session.write().await = PersistedSession::default();
        Ok(())
    }
}
