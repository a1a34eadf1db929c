use serde::{Deserialize, Serialize};

use crate::token::UserProfile;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: tokens plus the identity projection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(default)]
    pub is_verified: bool,
}

impl LoginResponse {
    pub(crate) fn user(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role.clone(),
            verified: self.is_verified,
        }
    }
}

/// "Who am I" response. The verification flag goes by a different name here
/// than in the login response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(default)]
    pub is_officially_enabled: bool,
}

impl ProfileResponse {
    pub(crate) fn into_user(self) -> UserProfile {
        UserProfile {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            verified: self.is_officially_enabled,
        }
    }
}

/// Payload for account registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ForgotPasswordRequest {
    pub email: String,
}

/// Payload for completing a password reset with the emailed OTP.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}
