//! Gateway configuration and backend route table.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Environment variable naming the backend origin, e.g. `https://api.example.com`.
const ENV_BASE_URL: &str = "STUDY_API_BASE_URL";
/// Optional override for the per-request timeout, in seconds.
const ENV_REQUEST_TIMEOUT: &str = "STUDY_API_REQUEST_TIMEOUT";
/// Optional override for the refresh-call timeout, in seconds.
const ENV_REFRESH_TIMEOUT: &str = "STUDY_API_REFRESH_TIMEOUT";

pub(crate) const LOGIN_PATH: &str = "/api/v1/auth/login";
pub(crate) const LOGOUT_PATH: &str = "/api/v1/auth/logout";
pub(crate) const REFRESH_PATH: &str = "/api/v1/auth/refresh";
pub(crate) const PROFILE_PATH: &str = "/api/v1/myProfile";
pub(crate) const REGISTER_PATH: &str = "/api/v1/auth/register";
pub(crate) const VERIFY_PATH: &str = "/api/v1/auth/verify";
pub(crate) const VERIFY_OTP_PATH: &str = "/api/v1/auth/verify-otp";
pub(crate) const FORGOT_PASSWORD_PATH: &str = "/api/v1/auth/forgot-password";
pub(crate) const RESET_PASSWORD_PATH: &str = "/api/v1/auth/reset-password";

/// Auth entry points that are reachable without an established session.
///
/// Requests to these paths bypass the 401 interception entirely: a rejected
/// login must surface as a credential error, never as a session teardown.
/// This replaces the original client's "already on the login page" check.
pub(crate) const PUBLIC_PATHS: &[&str] = &[
    LOGIN_PATH,
    REGISTER_PATH,
    VERIFY_PATH,
    VERIFY_OTP_PATH,
    FORGOT_PASSWORD_PATH,
    RESET_PASSWORD_PATH,
    REFRESH_PATH,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid duration value for {0}")]
    InvalidDuration(String),
}

/// Static configuration for the gateway.
///
/// Constructed once and handed to [`crate::SessionStore::new`]; the pipeline
/// and the refresh coordinator each hold a clone.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Backend origin every relative path is joined against.
    pub base_url: Url,
    /// Timeout applied to ordinary API requests.
    pub request_timeout: Duration,
    /// Timeout applied to the refresh call. A hung refresh would otherwise
    /// block every queued waiter indefinitely, so the refresh carries its own
    /// deadline and a timeout counts as a refresh failure.
    pub refresh_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(10),
        }
    }

    /// Build the configuration from the environment, loading `.env` first.
    ///
    /// `STUDY_API_BASE_URL` is required; the timeout overrides are optional
    /// and given in whole seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var(ENV_BASE_URL)
            .map_err(|_| ConfigError::MissingEnv(ENV_BASE_URL.to_string()))?;
        let base_url =
            Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;

        let mut config = Self::new(base_url);
        if let Some(timeout) = duration_from_env(ENV_REQUEST_TIMEOUT)? {
            config.request_timeout = timeout;
        }
        if let Some(timeout) = duration_from_env(ENV_REFRESH_TIMEOUT)? {
            config.refresh_timeout = timeout;
        }
        Ok(config)
    }

    /// Resolve a backend path against the configured origin.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url
            .join(path)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{path}: {e}")))
    }
}

fn duration_from_env(name: &str) -> Result<Option<Duration>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .map_err(|_| ConfigError::InvalidDuration(name.to_string()))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}
