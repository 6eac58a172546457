//! Verify Email Use Case
//!
//! Redeems an emailed verification token and marks the account verified.
//! Expired tokens are rejected but left in place; signing in again issues a
//! replacement.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_ledger::TokenLedger;
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::token_kind::TokenKind;
use crate::error::{AuthError, AuthResult};

/// Verify email use case
pub struct VerifyEmailUseCase<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    config: Arc<AuthConfig>,
}

impl<U, T> VerifyEmailUseCase<U, T>
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

    pub async fn execute(&self, token_value: &str) -> AuthResult<()> {
        if token_value.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let ledger = TokenLedger::new(self.token_repo.clone(), self.config.clone());
        let token = ledger
            .find(TokenKind::EmailVerification, token_value)
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

        user.mark_verified();
        self.user_repo.update(&user).await?;
        ledger.consume(TokenKind::EmailVerification, &token.id).await?;

        tracing::info!(user_id = %user.user_id, "email verified");
        Ok(())
    }
}
