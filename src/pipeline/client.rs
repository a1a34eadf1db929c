use std::sync::Arc;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::GatewayConfig;
use crate::pipeline::errors::ApiError;
use crate::pipeline::types::{ApiErrorBody, ApiRequest};
use crate::refresh::RefreshCoordinator;
use crate::token::TokenStore;

/// Builds the HTTP client shared by the pipeline and the refresh coordinator:
///
/// - `timeout`: the configured per-request deadline, so a stalled backend can
///   never hang a caller indefinitely.
/// - `pool_idle_timeout`/`pool_max_idle_per_host`: defaults tuned for a
///   handful of parallel API calls against a single origin.
pub(crate) fn build_http_client(config: &GatewayConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .build()
        .expect("Failed to create reqwest client")
}

/// The request pipeline: attaches the current access credential to outgoing
/// requests, observes every response, and recovers expired-token 401s through
/// the refresh coordinator with a single replay.
pub struct RequestPipeline {
    http: reqwest::Client,
    config: GatewayConfig,
    tokens: Arc<dyn TokenStore>,
    refresher: Arc<RefreshCoordinator>,
}

impl RequestPipeline {
    pub(crate) fn new(
        http: reqwest::Client,
        config: GatewayConfig,
        tokens: Arc<dyn TokenStore>,
        refresher: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            http,
            config,
            tokens,
            refresher,
        }
    }

    /// Send a request, transparently refreshing the access token once if the
    /// backend reports it expired.
    ///
    /// Flow on 401 with an expiry code (`TOKEN_EXPIRED`/`NO_TOKEN`): hand off
    /// to the refresh coordinator, then replay exactly once with the fresh
    /// credential. A second expiry on the replay, or a 401 without an expiry
    /// code, is terminal: the session is torn down and the error surfaces.
    /// Public requests (auth entry points, including the refresh endpoint
    /// itself) skip all of this.
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let url = self.config.endpoint(&request.path)?;
        let mut attempts: u8 = 0;

        loop {
            let mut builder = self.http.request(request.method.clone(), url.clone());

            if !request.bypasses_auth_handling() {
                let session = self.tokens.get().await?;
                if let Some(token) = session.credentials.access_token {
                    builder = builder.bearer_auth(token);
                }
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;
            let status = response.status();

            if status != StatusCode::UNAUTHORIZED {
                if status.is_success() {
                    return Ok(response);
                }
                let body = read_error_body(response).await;
                return Err(ApiError::Status {
                    status,
                    message: body.message,
                });
            }

            let body = read_error_body(response).await;

            if request.bypasses_auth_handling() {
                return Err(ApiError::Status {
                    status,
                    message: body.message,
                });
            }

            let code = body.auth_code();
            if code.is_some() && attempts == 0 {
                attempts += 1;
                tracing::debug!(
                    "Access token expired for {} {}, refreshing",
                    request.method,
                    request.path
                );
                Arc::clone(&self.refresher).refresh().await?;
                continue;
            }

            tracing::error!(
                "Unrecoverable 401 for {} {}, tearing session down",
                request.method,
                request.path
            );
            self.refresher.force_teardown().await;
            return Err(ApiError::Unauthorized {
                code,
                message: body.message,
            });
        }
    }

    /// `execute` plus JSON decoding of the success body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Best-effort parse of the backend's `{errorCode, message}` payload. A body
/// that is not JSON (or not that shape) classifies as a plain failure.
async fn read_error_body(response: Response) -> ApiErrorBody {
    match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(e) => {
            tracing::debug!("Failed to read error body: {e}");
            ApiErrorBody::default()
        }
    }
}
