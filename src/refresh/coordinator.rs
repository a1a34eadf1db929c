use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, oneshot};

use crate::config::{GatewayConfig, REFRESH_PATH};
use crate::refresh::errors::RefreshError;
use crate::refresh::types::{RefreshRequest, RefreshResponse};
use crate::token::TokenStore;

/// Application callback invoked once when the session ends involuntarily,
/// the library rendition of "navigate to the login page".
pub type ForceLogoutHook = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct RefreshState {
    /// True from the moment a refresh call is chosen until it settles. Set
    /// under the lock, before the first await point, so two callers can
    /// never both observe an idle coordinator.
    refreshing: bool,
    /// Callers that hit an expired token while a refresh was in flight. All
    /// settle together with the refresh outcome; none settles early.
    waiters: Vec<oneshot::Sender<Result<(), RefreshError>>>,
}

/// Serializes token refresh: at most one refresh HTTP call per expiry
/// episode, with every concurrent caller sharing its outcome.
///
/// One instance per gateway, owned by the session store and shared with the
/// pipeline. On success the token store holds the fresh credential before any
/// waiter resumes; on failure the store is cleared, every waiter is rejected,
/// and the force-logout hook fires at most once.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    config: GatewayConfig,
    tokens: Arc<dyn TokenStore>,
    state: Mutex<RefreshState>,
    torn_down: AtomicBool,
    on_force_logout: Option<ForceLogoutHook>,
}

impl RefreshCoordinator {
    pub(crate) fn new(
        http: reqwest::Client,
        config: GatewayConfig,
        tokens: Arc<dyn TokenStore>,
        on_force_logout: Option<ForceLogoutHook>,
    ) -> Self {
        Self {
            http,
            config,
            tokens,
            state: Mutex::new(RefreshState::default()),
            torn_down: AtomicBool::new(false),
            on_force_logout,
        }
    }

    /// Obtain a fresh access token, joining an in-flight refresh if one
    /// exists. Returns once the token store holds the new credential.
    ///
    /// The refresh call itself runs in a spawned task, so it settles and
    /// releases the waiters even if the caller that started it is cancelled
    /// (a `timeout` or `select!` around the original request). Every caller,
    /// the first included, observes the outcome through its own channel.
    pub async fn refresh(self: Arc<Self>) -> Result<(), RefreshError> {
        let rx = {
            let mut state = self.state.lock().await;
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            if state.refreshing {
                tracing::debug!("Refresh already in flight, queuing");
            } else {
                state.refreshing = true;
                tokio::spawn(self.clone().run_refresh());
            }
            rx
        };

        rx.await.unwrap_or_else(|_| {
            Err(RefreshError::Network(
                "refresh task dropped before settling".to_string(),
            ))
        })
    }

    /// Drive one refresh call to completion and fan the outcome out.
    async fn run_refresh(self: Arc<Self>) {
        let outcome = self.execute_refresh().await;

        let waiters = {
            let mut state = self.state.lock().await;
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        if let Err(e) = &outcome {
            tracing::error!("Token refresh failed, ending session: {e}");
            self.force_teardown().await;
        } else {
            tracing::debug!("Refresh settled, releasing {} waiter(s)", waiters.len());
        }

        for waiter in waiters {
            // A waiter whose request future was dropped is gone; that is fine.
            let _ = waiter.send(outcome.clone());
        }
    }

    /// The single network refresh call for this expiry episode. Carries its
    /// own deadline: a hung refresh must not block the waiters forever.
    async fn execute_refresh(&self) -> Result<(), RefreshError> {
        let session = self.tokens.get().await?;
        let refresh_token = session
            .credentials
            .refresh_token
            .ok_or(RefreshError::MissingRefreshToken)?;

        let url = self.config.endpoint(REFRESH_PATH)?;
        let response = self
            .http
            .post(url)
            .timeout(self.config.refresh_timeout)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected(status.to_string()));
        }

        // A success body without an access token is as terminal as a refusal.
        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::MalformedResponse(e.to_string()))?;

        let mut session = self.tokens.get().await?;
        session.credentials.access_token = Some(body.access_token);
        if let Some(rotated) = body.refresh_token {
            session.credentials.refresh_token = Some(rotated);
        }
        session.saved_at = Some(Utc::now());
        self.tokens.set(session).await?;

        tracing::debug!("Access token refreshed");
        Ok(())
    }

    /// Unconditional session teardown: clear the token store and notify the
    /// application. The notification fires at most once per teardown episode
    /// even when several waiters fail together; `arm` re-enables it after the
    /// next successful login.
    pub async fn force_teardown(&self) {
        if let Err(e) = self.tokens.clear().await {
            tracing::error!("Failed to clear token store during teardown: {e}");
        }

        if !self.torn_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session torn down, notifying application");
            if let Some(hook) = &self.on_force_logout {
                hook();
            }
        }
    }

    /// Re-arm the force-logout notification for the next teardown episode.
    pub(crate) fn arm(&self) {
        self.torn_down.store(false, Ordering::SeqCst);
    }
}
