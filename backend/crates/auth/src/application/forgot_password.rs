//! Forgot Password Use Case
//!
//! Issues a password reset token and emails the reset link. The response
//! waits on the mail provider so a delivery failure surfaces to the caller.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::mailer::EmailSender;
use crate::application::token_ledger::TokenLedger;
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, token_kind::TokenKind};
use crate::error::{AuthError, AuthResult};

/// Forgot password use case
pub struct ForgotPasswordUseCase<U, T, M>
where
    U: UserRepository,
    T: TokenRepository,
    M: EmailSender,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    mailer: M,
    config: Arc<AuthConfig>,
}

impl<U, T, M> ForgotPasswordUseCase<U, T, M>
where
    U: UserRepository,
    T: TokenRepository,
    M: EmailSender,
{
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>, mailer: M, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email).map_err(|_| AuthError::EmailNotFound)?;
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        let ledger = TokenLedger::new(self.token_repo.clone(), self.config.clone());
        let token = ledger.issue(TokenKind::PasswordReset, &user.email).await?;
        self.mailer
            .send_password_reset_email(&user.email, &token.token)
            .await?;

        tracing::info!(user_id = %user.user_id, "password reset email sent");
        Ok(())
    }
}
