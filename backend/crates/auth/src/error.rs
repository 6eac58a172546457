use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use kernel::error::kind::ErrorKind;
use serde_json::json;
use thiserror::Error;

use crate::infra::jwt::JwtError;

/// Errors raised by authentication and authorization flows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email is not verified yet")]
    PendingVerification,

    #[error("Invalid two-factor code")]
    InvalidCode,

    #[error("Two-factor code has expired")]
    ExpiredCode,

    #[error("Email has already been taken")]
    EmailTaken,

    #[error("Missing token")]
    MissingToken,

    #[error("Token does not exist")]
    TokenNotFound,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Email does not exist")]
    EmailNotFound,

    #[error("Missing access token")]
    MissingCredentials,

    #[error("Invalid access token")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid password: {0}")]
    PasswordValidation(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::InvalidCode
            | Self::ExpiredCode
            | Self::MissingToken
            | Self::TokenNotFound
            | Self::TokenExpired
            | Self::MissingCredentials
            | Self::PasswordValidation(_)
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PendingVerification | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::EmailNotFound => StatusCode::NOT_FOUND,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials
            | Self::InvalidCode
            | Self::ExpiredCode
            | Self::MissingToken
            | Self::TokenNotFound
            | Self::TokenExpired
            | Self::MissingCredentials
            | Self::PasswordValidation(_)
            | Self::Validation(_) => ErrorKind::BadRequest,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::PendingVerification | Self::Forbidden => ErrorKind::Forbidden,
            Self::EmailNotFound => ErrorKind::NotFound,
            Self::EmailTaken => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Server faults log at error, client rejections at warn
    pub fn log(&self) {
        if self.kind().is_server_error() {
            tracing::error!(error = %self, "auth error");
        } else {
            tracing::warn!(error = %self, "auth rejection");
        }
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => Self::Validation(err.to_string()),
            ErrorKind::Unauthorized => Self::Unauthorized,
            ErrorKind::Forbidden => Self::Forbidden,
            ErrorKind::NotFound => Self::EmailNotFound,
            ErrorKind::Conflict => Self::EmailTaken,
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from(err).into()
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Invalid | JwtError::Expired => Self::Unauthorized,
            JwtError::MissingSecret | JwtError::Encode(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let kind = self.kind();
        let body = json!({
            "type": "about:blank",
            "title": kind.as_str(),
            "status": status.as_u16(),
            "detail": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
