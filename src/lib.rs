//! study-gateway - Authenticated request gateway for the study-assistant API
//!
//! This crate owns the client side of the session lifecycle: it attaches
//! bearer credentials to outgoing requests, transparently refreshes an
//! expired access token with single-flight coordination (concurrent callers
//! share one refresh call), and tears the session down on terminal auth
//! failure.
//!
//! Layering, leaves first: the token store holds and persists the credential
//! pair and user identity; the request pipeline wraps every API call; the
//! refresh coordinator serializes refresh; the session store is the surface
//! the application talks to (`login`, `check_auth`, `logout`, plus the
//! account operations).
//!
//! ```no_run
//! use std::sync::Arc;
//! use study_gateway::{FileTokenStore, GatewayConfig, SessionStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env()?;
//! let tokens = Arc::new(FileTokenStore::open("session.json").await?);
//! let session = SessionStore::with_force_logout_hook(config, tokens, || {
//!     // return the UI to the login screen
//! });
//!
//! let user = session.login("student@example.com", "hunter2").await?;
//! println!("hello {}", user.first_name);
//! # Ok(())
//! # }
//! ```

mod config;
mod pipeline;
mod refresh;
mod session;
mod token;

pub use config::{ConfigError, GatewayConfig};
pub use pipeline::{ApiError, ApiErrorBody, ApiRequest, AuthErrorCode, RequestPipeline};
pub use refresh::{ForceLogoutHook, RefreshCoordinator, RefreshError};
pub use session::{AuthError, RegisterRequest, ResetPasswordRequest, SessionStore};
pub use token::{
    CredentialPair, FileTokenStore, MemoryTokenStore, PersistedSession, TokenStore,
    TokenStoreError, UserProfile,
};
