//! Reset Password Use Case
//!
//! Redeems a password reset token and replaces the stored password hash.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_ledger::TokenLedger;
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::{
    token_kind::TokenKind, user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Reset password input
pub struct ResetPasswordInput {
    pub token: String,
    pub password: String,
}

/// Reset password use case
pub struct ResetPasswordUseCase<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    config: Arc<AuthConfig>,
}

impl<U, T> ResetPasswordUseCase<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            token_repo,
            config,
        }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AuthResult<()> {
        if input.token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let ledger = TokenLedger::new(self.token_repo.clone(), self.config.clone());
        let token = ledger
            .find(TokenKind::PasswordReset, &input.token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        if token.has_expired() {
            return Err(AuthError::TokenExpired);
        }

        let mut user = self
            .user_repo
            .find_by_email(&token.email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;
        user.set_password(UserPassword::from_raw(&raw_password)?);

        self.user_repo.update(&user).await?;
        ledger.consume(TokenKind::PasswordReset, &token.id).await?;

        tracing::info!(user_id = %user.user_id, "password reset completed");
        Ok(())
    }
}
