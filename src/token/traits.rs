use async_trait::async_trait;

use super::errors::TokenStoreError;
use super::types::PersistedSession;

/// Durable holder for the credential pair and user identity.
///
/// Pure state, no network behavior: the interesting coordination lives in the
/// refresh coordinator, which is the only writer during an expiry episode.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Snapshot of the current session record (all-absent when anonymous).
    async fn get(&self) -> Result<PersistedSession, TokenStoreError>;

    /// Replace the stored record and persist it.
    async fn set(&self, session: PersistedSession) -> Result<(), TokenStoreError>;

    /// Drop all stored values, returning the store to the anonymous state.
    async fn clear(&self) -> Result<(), TokenStoreError>;
}
