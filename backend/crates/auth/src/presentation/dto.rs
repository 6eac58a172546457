//! Request/Response DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sign up request
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

/// Sign up response
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

/// Sign in request
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    /// Two-factor code on the second round-trip
    pub code: Option<String>,
}

/// Sign in response when a two-factor code was emailed
#[derive(Debug, Serialize)]
pub struct TwoFactorResponse {
    #[serde(rename = "twoFactor")]
    pub two_factor: bool,
}

/// Sign in response once a session was issued
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub csrf_token: String,
    pub access_token: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub role: String,
    #[serde(rename = "isTwoFactorEnabled")]
    pub is_two_factor_enabled: bool,
}

/// Verify email request
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Forgot password request
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset password request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// User info response
#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub role: String,
    #[serde(rename = "isTwoFactorEnabled")]
    pub is_two_factor_enabled: bool,
    #[serde(rename = "emailVerified")]
    pub email_verified: bool,
}

impl From<&crate::domain::entity::user::User> for UserInfoResponse {
    fn from(user: &crate::domain::entity::user::User) -> Self {
        Self {
            user_id: *user.user_id.as_uuid(),
            email: user.email.as_str().to_string(),
            username: user.username.clone(),
            role: user.role.code().to_string(),
            is_two_factor_enabled: user.is_two_factor_enabled,
            email_verified: user.is_verified(),
        }
    }
}
