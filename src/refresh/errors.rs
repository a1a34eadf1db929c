use thiserror::Error;

use crate::config::ConfigError;
use crate::token::TokenStoreError;

/// Terminal refresh failures. Always followed by session teardown; never
/// retried within the same expiry episode.
///
/// Clone because one failure is fanned out to every queued waiter.
#[derive(Debug, Error, Clone)]
pub enum RefreshError {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Refresh call failed: {0}")]
    Network(String),

    #[error("Refresh rejected by server: {0}")]
    Rejected(String),

    #[error("Malformed refresh response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<TokenStoreError> for RefreshError {
    fn from(e: TokenStoreError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<ConfigError> for RefreshError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
