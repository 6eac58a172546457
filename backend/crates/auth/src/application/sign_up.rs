//! Sign Up Use Case
//!
//! Registers a new user and emails a verification link. The account stays
//! unverified (and unable to sign in) until the link is redeemed.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::mailer::EmailSender;
use crate::application::token_ledger::TokenLedger;
use crate::domain::entity::user::User;
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, token_kind::TokenKind, user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Sign up output
pub struct SignUpOutput {
    pub user_id: Uuid,
}

/// Sign up use case
pub struct SignUpUseCase<U, T, M>
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

impl<U, T, M> SignUpUseCase<U, T, M>
where
    U: UserRepository,
    T: TokenRepository,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>, mailer: M, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = Email::new(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;
        let password_hash = UserPassword::from_raw(&raw_password)?;

        let user = User::new(email, input.username, password_hash);
        self.user_repo.create(&user).await?;

        let ledger = TokenLedger::new(self.token_repo.clone(), self.config.clone());
        let token = ledger.issue(TokenKind::EmailVerification, &user.email).await?;

        let mailer = self.mailer.clone();
        let recipient = user.email.clone();
        let value = token.token;
        tokio::spawn(async move {
            if let Err(e) = mailer.send_verification_email(&recipient, &value).await {
                tracing::warn!(email = %recipient, error = %e, "verification email dispatch failed");
            }
        });

        tracing::info!(user_id = %user.user_id, "user registered");

        Ok(SignUpOutput {
            user_id: user.user_id.into_uuid(),
        })
    }
}
