use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The bearer credentials the gateway operates on.
///
/// Both fields are opaque to the client. An access token is never reused once
/// the pipeline has observed an expiry signal for it; the refresh token is
/// used only against the refresh endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }
}

/// Identity projection returned by the login and profile endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub verified: bool,
}

/// Everything the token store persists across restarts.
///
/// The single shared mutable record of the gateway: mutated only by the
/// refresh coordinator and the session store, read by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    pub credentials: CredentialPair,
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedSession {
    pub fn authenticated(credentials: CredentialPair, user: UserProfile) -> Self {
        Self {
            credentials,
            user: Some(user),
            is_authenticated: true,
            saved_at: Some(Utc::now()),
        }
    }
}
