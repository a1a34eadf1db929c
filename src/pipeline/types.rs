use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::config::PUBLIC_PATHS;
use crate::pipeline::errors::ApiError;

/// Replayable description of an outgoing API call.
///
/// The pipeline needs to re-send a request after a token refresh, so the
/// request is kept as data rather than as a built `reqwest::Request`. The
/// retry budget is an explicit per-call counter inside the pipeline, never a
/// flag smuggled onto a shared object.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    is_public: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            is_public: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Attach a JSON body.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(|e| ApiError::Serde(e.to_string()))?);
        Ok(self)
    }

    /// Mark the request as reachable without a session: no bearer credential
    /// is attached and a 401 is surfaced as-is instead of entering the
    /// refresh or teardown flow.
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    /// True when the request must bypass the 401 interception, either because
    /// the caller said so or because the path is an auth entry point. The
    /// refresh endpoint is always in this set: a 401 from it must never
    /// trigger another refresh.
    pub(crate) fn bypasses_auth_handling(&self) -> bool {
        self.is_public || PUBLIC_PATHS.contains(&self.path.as_str())
    }
}

/// Auth-specific error codes the backend attaches to 401 responses.
///
/// The code, not the bare status, decides between the refresh flow and a
/// terminal teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    TokenExpired,
    NoToken,
}

/// Error payload shape the backend uses: `{"errorCode": ..., "message": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub error_code: Option<String>,
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Parse the error code into the expiry signal, if it is one.
    pub fn auth_code(&self) -> Option<AuthErrorCode> {
        match self.error_code.as_deref() {
            Some("TOKEN_EXPIRED") => Some(AuthErrorCode::TokenExpired),
            Some("NO_TOKEN") => Some(AuthErrorCode::NoToken),
            _ => None,
        }
    }
}
