use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::errors::TokenStoreError;
use super::traits::TokenStore;
use super::types::PersistedSession;

/// File-backed token store: a JSON record that survives process restarts,
/// the native counterpart of the original client's persisted auth storage.
///
/// Reads are served from memory; every mutation is written through to disk
/// before it is acknowledged. `clear` resets the in-memory record first so a
/// failed file removal can never leave credentials visible to callers.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    session: RwLock<PersistedSession>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading an existing record if one is present.
    ///
    /// A missing file is the anonymous state, not an error. A corrupt file is
    /// discarded with a warning: stale credentials are recoverable via login,
    /// while refusing to start is not.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TokenStoreError> {
        let path = path.as_ref().to_path_buf();
        let session = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<PersistedSession>(&bytes) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("Discarding unreadable session file {:?}: {}", path, e);
                    PersistedSession::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PersistedSession::default(),
            Err(e) => return Err(TokenStoreError::Storage(e.to_string())),
        };

        Ok(Self {
            path,
            session: RwLock::new(session),
        })
    }

    async fn write_through(&self, session: &PersistedSession) -> Result<(), TokenStoreError> {
        let bytes =
            serde_json::to_vec_pretty(session).map_err(|e| TokenStoreError::Serde(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TokenStoreError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| TokenStoreError::Storage(e.to_string()))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Result<PersistedSession, TokenStoreError> {
        Ok(self.session.read().await.clone())
    }

    async fn set(&self, session: PersistedSession) -> Result<(), TokenStoreError> {
        let mut guard = self.session.write().await;
        self.write_through(&session).await?;
        *guard = session;
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        let mut guard = self.session.write().await;
        *guard = PersistedSession::default();
        drop(guard);

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStoreError::Storage(e.to_string())),
        }
    }
}
