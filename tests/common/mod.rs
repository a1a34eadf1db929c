//! Axum-based mock study-assistant backend for integration tests.
//!
//! Each test spawns its own instance on an ephemeral port. The handlers
//! implement the auth contract the gateway depends on: bearer-checked
//! protected routes with `{errorCode, message}` 401 payloads, a refresh
//! endpoint that rotates the access token, and switchable failure modes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};

pub const TEST_EMAIL: &str = "student@example.com";
pub const TEST_PASSWORD: &str = "hunter2";

/// Behavior of the refresh endpoint.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Rotate the access token and return it.
    Succeed,
    /// Reject with 401, as after refresh-token revocation.
    Fail,
    /// Return 200 with a body missing the access token.
    Malformed,
}

/// Behavior of the protected `/api/v1/notes` route.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum NotesMode {
    /// Bearer-checked, 200 on a valid token.
    Normal,
    /// 401 with `TOKEN_EXPIRED` no matter what token arrives.
    AlwaysExpired,
    /// 401 without any error code (e.g. a revoked account).
    Plain401,
}

pub struct BackendState {
    access_token: Mutex<String>,
    refresh_token: Mutex<String>,
    token_serial: AtomicUsize,
    refresh_mode: Mutex<RefreshMode>,
    refresh_delay: Mutex<Duration>,
    notes_mode: Mutex<NotesMode>,
    logout_fails: AtomicBool,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub notes_calls: AtomicUsize,
    pub notes_ok: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            access_token: Mutex::new("access-1".to_string()),
            refresh_token: Mutex::new("refresh-1".to_string()),
            token_serial: AtomicUsize::new(1),
            refresh_mode: Mutex::new(RefreshMode::Succeed),
            refresh_delay: Mutex::new(Duration::ZERO),
            notes_mode: Mutex::new(NotesMode::Normal),
            logout_fails: AtomicBool::new(false),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            notes_calls: AtomicUsize::new(0),
            notes_ok: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }
}

pub struct MockBackend {
    pub state: Arc<BackendState>,
    pub base_url: String,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::default());

        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/refresh", post(refresh))
            .route("/api/v1/auth/logout", post(logout))
            .route("/api/v1/myProfile", get(profile))
            .route("/api/v1/notes", get(notes))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr: SocketAddr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn current_access(&self) -> String {
        self.state.access_token.lock().unwrap().clone()
    }

    pub fn current_refresh(&self) -> String {
        self.state.refresh_token.lock().unwrap().clone()
    }

    /// Invalidate whatever access token clients hold by rotating the
    /// server-side one.
    pub fn expire_access_token(&self) {
        let serial = self.state.token_serial.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.access_token.lock().unwrap() = format!("access-{serial}");
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.state.refresh_mode.lock().unwrap() = mode;
    }

    /// Hold refresh responses open for `delay`, widening the in-flight window
    /// so concurrent expiries deterministically pile onto one refresh call.
    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.state.refresh_delay.lock().unwrap() = delay;
    }

    pub fn set_notes_mode(&self, mode: NotesMode) {
        *self.state.notes_mode.lock().unwrap() = mode;
    }

    pub fn set_logout_fails(&self, fails: bool) {
        self.state.logout_fails.store(fails, Ordering::SeqCst);
    }
}

fn user_fields() -> Value {
    json!({
        "email": TEST_EMAIL,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "role": "student"
    })
}

fn unauthorized(code: Option<&str>, message: &str) -> impl IntoResponse {
    let mut body = json!({"message": message});
    if let Some(code) = code {
        body["errorCode"] = json!(code);
    }
    (StatusCode::UNAUTHORIZED, Json(body))
}

/// Bearer check shared by the protected routes.
fn check_bearer(state: &BackendState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"errorCode": "NO_TOKEN", "message": "No token provided"})),
        ));
    };
    let token = value
        .to_str()
        .unwrap_or_default()
        .strip_prefix("Bearer ")
        .unwrap_or_default();
    if token != state.access_token.lock().unwrap().as_str() {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"errorCode": "TOKEN_EXPIRED", "message": "Access token expired"})),
        ));
    }
    Ok(())
}

async fn login(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    if body["email"] == TEST_EMAIL && body["password"] == TEST_PASSWORD {
        let mut response = user_fields();
        response["isVerified"] = json!(true);
        response["accessToken"] = json!(state.access_token.lock().unwrap().clone());
        response["refreshToken"] = json!(state.refresh_token.lock().unwrap().clone());
        (StatusCode::OK, Json(response)).into_response()
    } else {
        unauthorized(None, "Invalid email or password").into_response()
    }
}

async fn refresh(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = *state.refresh_delay.lock().unwrap();
    if delay > Duration::ZERO {
        tokio::time::sleep(delay).await;
    }

    match *state.refresh_mode.lock().unwrap() {
        RefreshMode::Fail => unauthorized(None, "Refresh token revoked").into_response(),
        RefreshMode::Malformed => (StatusCode::OK, Json(json!({}))).into_response(),
        RefreshMode::Succeed => {
            if body["refreshToken"] != state.refresh_token.lock().unwrap().as_str() {
                return unauthorized(None, "Unknown refresh token").into_response();
            }
            let serial = state.token_serial.fetch_add(1, Ordering::SeqCst) + 1;
            let fresh = format!("access-{serial}");
            *state.access_token.lock().unwrap() = fresh.clone();
            (StatusCode::OK, Json(json!({"accessToken": fresh}))).into_response()
        }
    }
}

async fn logout(State(state): State<Arc<BackendState>>) -> impl IntoResponse {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);

    if state.logout_fails.load(Ordering::SeqCst) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "revoke failed"})),
        )
            .into_response()
    } else {
        (StatusCode::OK, Json(json!({"message": "logged out"}))).into_response()
    }
}

async fn profile(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.profile_calls.fetch_add(1, Ordering::SeqCst);

    if let Err(rejection) = check_bearer(&state, &headers) {
        return rejection.into_response();
    }
    let mut response = user_fields();
    response["isOfficiallyEnabled"] = json!(true);
    (StatusCode::OK, Json(response)).into_response()
}

async fn notes(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> impl IntoResponse {
    state.notes_calls.fetch_add(1, Ordering::SeqCst);

    match *state.notes_mode.lock().unwrap() {
        NotesMode::AlwaysExpired => {
            unauthorized(Some("TOKEN_EXPIRED"), "Access token expired").into_response()
        }
        NotesMode::Plain401 => unauthorized(None, "Account disabled").into_response(),
        NotesMode::Normal => {
            if let Err(rejection) = check_bearer(&state, &headers) {
                return rejection.into_response();
            }
            state.notes_ok.fetch_add(1, Ordering::SeqCst);
            (
                StatusCode::OK,
                Json(json!([{"id": 1, "title": "Photosynthesis summary"}])),
            )
                .into_response()
        }
    }
}
