//! Outbound Email Implementations
//!
//! `ResendMailer` delivers through the Resend HTTP API. `LogMailer` only
//! logs, for local development without an API key.

use serde_json::json;

use crate::application::mailer::EmailSender;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Default sender address for transactional mail
const DEFAULT_FROM: &str = "onboarding@resend.dev";

/// Resend-backed mailer
#[derive(Clone)]
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    app_url: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, app_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            app_url: app_url.into(),
            from: DEFAULT_FROM.to_string(),
        }
    }

    async fn send(&self, to: &Email, subject: &str, html: String) -> AuthResult<()> {
        let body = json!({
            "from": self.from,
            "to": to.as_str(),
            "subject": subject,
            "html": html,
        });

        let response = self
            .http
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Internal(format!("Email dispatch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Internal(format!(
                "Email dispatch failed: {}",
                response.status()
            )));
        }

        tracing::debug!(to = %to, subject, "email dispatched");
        Ok(())
    }
}

impl EmailSender for ResendMailer {
    async fn send_verification_email(&self, email: &Email, token: &str) -> AuthResult<()> {
        let link = format!("{}/new-verification?token={}", self.app_url, token);
        self.send(
            email,
            "Confirm your email",
            format!("<p>Click <a href=\"{link}\">here</a> to confirm your email.</p>"),
        )
        .await
    }

    async fn send_password_reset_email(&self, email: &Email, token: &str) -> AuthResult<()> {
        let link = format!("{}/new-password?token={}", self.app_url, token);
        self.send(
            email,
            "Reset your password",
            format!("<p>Click <a href=\"{link}\">here</a> to reset your password.</p>"),
        )
        .await
    }

    async fn send_two_factor_email(&self, email: &Email, code: &str) -> AuthResult<()> {
        self.send(
            email,
            "2FA Code",
            format!("<p>Your 2FA code: {code}</p>"),
        )
        .await
    }
}

/// Mailer that logs instead of sending
#[derive(Clone, Default)]
pub struct LogMailer;

impl EmailSender for LogMailer {
    async fn send_verification_email(&self, email: &Email, token: &str) -> AuthResult<()> {
        tracing::info!(to = %email, token, "verification email (log only)");
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &Email, token: &str) -> AuthResult<()> {
        tracing::info!(to = %email, token, "password reset email (log only)");
        Ok(())
    }

    async fn send_two_factor_email(&self, email: &Email, code: &str) -> AuthResult<()> {
        tracing::info!(to = %email, code, "two-factor email (log only)");
        Ok(())
    }
}
