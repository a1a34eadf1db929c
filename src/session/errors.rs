use thiserror::Error;

use crate::pipeline::ApiError;
use crate::token::TokenStoreError;

/// Errors surfaced by the session store.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login rejected by the server. Local session state is untouched.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A response was missing a field the session layer depends on.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Failure from the underlying request pipeline.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),
}
