use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::types::AuthErrorCode;
use crate::refresh::RefreshError;
use crate::token::TokenStoreError;

/// Errors surfaced by the request pipeline.
///
/// `Unauthorized` is terminal by the time the caller sees it: the session has
/// already been torn down. A recovered token expiry is invisible here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-auth failure status, propagated untouched with the server message.
    #[error("Request failed with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// Terminal 401: no expiry signal, or the single replay failed too.
    #[error("Unauthorized: {}", message.as_deref().unwrap_or("session ended"))]
    Unauthorized {
        code: Option<AuthErrorCode>,
        message: Option<String>,
    },

    /// The refresh cycle failed; the session has been torn down.
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
