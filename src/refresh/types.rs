use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/auth/refresh`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh response. The server may rotate the refresh token; when it does
/// not, the stored one stays valid.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
}
