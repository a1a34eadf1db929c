use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;

use crate::config::{
    FORGOT_PASSWORD_PATH, GatewayConfig, LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, REGISTER_PATH,
    RESET_PASSWORD_PATH, VERIFY_OTP_PATH, VERIFY_PATH,
};
use crate::pipeline::{ApiError, ApiRequest, RequestPipeline, build_http_client};
use crate::refresh::{ForceLogoutHook, RefreshCoordinator};
use crate::session::errors::AuthError;
use crate::session::types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, OtpRequest, ProfileResponse,
    RegisterRequest, ResetPasswordRequest,
};
use crate::token::{CredentialPair, PersistedSession, TokenStore, UserProfile};

/// The interface the rest of the application uses to establish, verify, and
/// end a session.
///
/// Owns the refresh coordinator and the request pipeline; constructed once
/// per application. All session state lives in the token store, so the
/// coordinator's forced teardown and the methods here can never disagree
/// about whether a session exists.
pub struct SessionStore {
    tokens: Arc<dyn TokenStore>,
    pipeline: Arc<RequestPipeline>,
    refresher: Arc<RefreshCoordinator>,
}

impl SessionStore {
    pub fn new(config: GatewayConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self::build(config, tokens, None)
    }

    /// Like [`SessionStore::new`], with a callback invoked once per forced
    /// teardown (the application's "go to the login screen").
    pub fn with_force_logout_hook(
        config: GatewayConfig,
        tokens: Arc<dyn TokenStore>,
        hook: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self::build(config, tokens, Some(Box::new(hook)))
    }

    fn build(
        config: GatewayConfig,
        tokens: Arc<dyn TokenStore>,
        hook: Option<ForceLogoutHook>,
    ) -> Self {
        let http = build_http_client(&config);
        let refresher = Arc::new(RefreshCoordinator::new(
            http.clone(),
            config.clone(),
            tokens.clone(),
            hook,
        ));
        let pipeline = Arc::new(RequestPipeline::new(
            http,
            config,
            tokens.clone(),
            refresher.clone(),
        ));
        Self {
            tokens,
            pipeline,
            refresher,
        }
    }

    /// The authenticated pipeline, for feature services (notes, quizzes,
    /// dashboards) that ride the same gateway.
    pub fn pipeline(&self) -> Arc<RequestPipeline> {
        self.pipeline.clone()
    }

    /// Authenticate with the backend and establish a session.
    ///
    /// On a credential rejection the error carries the server-provided
    /// message and local state is untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .with_json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })?
            .public();

        let response: LoginResponse = match self.pipeline.send_json(request).await {
            Ok(response) => response,
            Err(ApiError::Status { status, message })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST =>
            {
                return Err(AuthError::InvalidCredentials(
                    message.unwrap_or_else(|| "Invalid email or password".to_string()),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let user = response.user();
        let access_token = response.access_token.ok_or_else(|| {
            AuthError::MalformedResponse("login response carried no access token".to_string())
        })?;
        if response.refresh_token.is_none() {
            tracing::warn!("Login response carried no refresh token; session cannot be refreshed");
        }

        self.tokens
            .set(PersistedSession::authenticated(
                CredentialPair {
                    access_token: Some(access_token),
                    refresh_token: response.refresh_token,
                },
                user.clone(),
            ))
            .await?;
        self.refresher.arm();

        tracing::debug!("Session established for {}", user.email);
        Ok(user)
    }

    /// Validate an existing session against the "who am I" endpoint.
    ///
    /// `Ok(None)` means the backend rejected the session; the pipeline and
    /// coordinator have already torn it down, so nothing is cleared here (the
    /// teardown decision has exactly one owner). A non-auth failure clears
    /// the identity flags but keeps the credentials: they may still be valid
    /// once the network recovers.
    pub async fn check_auth(&self) -> Result<Option<UserProfile>, AuthError> {
        match self
            .pipeline
            .send_json::<ProfileResponse>(ApiRequest::get(PROFILE_PATH))
            .await
        {
            Ok(profile) => {
                let user = profile.into_user();
                let mut session = self.tokens.get().await?;
                session.user = Some(user.clone());
                session.is_authenticated = true;
                session.saved_at = Some(Utc::now());
                self.tokens.set(session).await?;
                tracing::debug!("Auth valid: {}", user.email);
                Ok(Some(user))
            }
            Err(ApiError::Unauthorized { .. }) | Err(ApiError::Refresh(_)) => Ok(None),
            Err(e) => {
                tracing::debug!("Auth check failed: {e}");
                let mut session = self.tokens.get().await?;
                session.user = None;
                session.is_authenticated = false;
                self.tokens.set(session).await?;
                Err(e.into())
            }
        }
    }

    /// End the session. The server-side revoke is best effort; local state is
    /// cleared no matter how that call ends.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Err(e) = self.pipeline.execute(ApiRequest::post(LOGOUT_PATH)).await {
            tracing::warn!("Server-side logout failed, clearing local session anyway: {e}");
        }
        self.tokens.clear().await?;
        tracing::debug!("Session cleared");
        Ok(())
    }

    /// Unconditional teardown plus the force-logout notification. Normally
    /// driven by the refresh coordinator; exposed for applications that need
    /// to end the session from the outside.
    pub async fn force_logout(&self) {
        self.refresher.force_teardown().await;
    }

    /// The persisted identity, if a session is established.
    pub async fn current_user(&self) -> Result<Option<UserProfile>, AuthError> {
        let session = self.tokens.get().await?;
        Ok(session.is_authenticated.then_some(session.user).flatten())
    }

    pub async fn is_authenticated(&self) -> Result<bool, AuthError> {
        Ok(self.tokens.get().await?.is_authenticated)
    }

    /// Create an account. The session starts only after OTP verification and
    /// login.
    pub async fn register(&self, request: RegisterRequest) -> Result<(), AuthError> {
        let request = ApiRequest::post(REGISTER_PATH).with_json(&request)?.public();
        self.pipeline.execute(request).await?;
        Ok(())
    }

    /// Confirm a fresh registration with the emailed OTP.
    pub async fn verify_registration(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        self.post_otp(VERIFY_PATH, email, otp).await
    }

    /// Verify a one-time password challenge.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        self.post_otp(VERIFY_OTP_PATH, email, otp).await
    }

    /// Request a password-reset OTP for `email`.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let request = ApiRequest::post(FORGOT_PASSWORD_PATH)
            .with_json(&ForgotPasswordRequest {
                email: email.to_string(),
            })?
            .public();
        self.pipeline.execute(request).await?;
        Ok(())
    }

    /// Complete a password reset.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AuthError> {
        let request = ApiRequest::post(RESET_PASSWORD_PATH)
            .with_json(&request)?
            .public();
        self.pipeline.execute(request).await?;
        Ok(())
    }

    async fn post_otp(&self, path: &str, email: &str, otp: &str) -> Result<(), AuthError> {
        let request = ApiRequest::post(path)
            .with_json(&OtpRequest {
                email: email.to_string(),
                otp: otp.to_string(),
            })?
            .public();
        self.pipeline.execute(request).await?;
        Ok(())
    }
}
