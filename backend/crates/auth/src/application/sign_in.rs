//! Sign In Use Case
//!
//! Authenticates a user and issues a session token. Unverified accounts are
//! re-sent a verification link instead, and accounts with two-factor enabled
//! go through an emailed one-time code first.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::mailer::EmailSender;
use crate::application::token_ledger::TokenLedger;
use crate::domain::entity::two_factor_confirmation::TwoFactorConfirmation;
use crate::domain::permissions::{RuleSet, rules_for};
use crate::domain::repository::{ConfirmationRepository, TokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, role_name::RoleName, token_kind::TokenKind, user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};
use crate::infra::jwt::JwtIssuer;

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    /// Two-factor code, present on the second round-trip
    pub code: Option<String>,
}

/// Issued session details
pub struct SessionIssued {
    pub access_token: String,
    pub csrf_token: String,
    /// Session lifetime in seconds
    pub expires_in: i64,
    pub user_id: Uuid,
    pub role: RoleName,
    pub is_two_factor_enabled: bool,
}

/// Sign in outcome
pub enum SignInOutcome {
    /// A two-factor code was emailed; no session was issued
    TwoFactorChallenge,
    /// Credentials (and code, if required) checked out
    Session(SessionIssued),
}

/// Sign in use case
pub struct SignInUseCase<U, T, C, M>
where
    U: UserRepository,
    T: TokenRepository,
    C: ConfirmationRepository,
    M: EmailSender,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    confirmation_repo: Arc<C>,
    mailer: M,
    jwt: Arc<JwtIssuer>,
    config: Arc<AuthConfig>,
}

impl<U, T, C, M> SignInUseCase<U, T, C, M>
where
    U: UserRepository,
    T: TokenRepository,
    C: ConfirmationRepository,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        confirmation_repo: Arc<C>,
        mailer: M,
        jwt: Arc<JwtIssuer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            confirmation_repo,
            mailer,
            jwt,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutcome> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let raw_password =
            RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;
        if !user.password_hash.verify(&raw_password) {
            tracing::warn!(email = %user.email, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let ledger = TokenLedger::new(self.token_repo.clone(), self.config.clone());

        // Unverified accounts get a fresh verification link, never a session
        if !user.is_verified() {
            let token = ledger.issue(TokenKind::EmailVerification, &user.email).await?;
            self.dispatch_verification_email(token.email.clone(), token.token.clone());
            return Err(AuthError::PendingVerification);
        }

        if user.is_two_factor_enabled {
            match input.code.as_deref() {
                None => {
                    let token = ledger.issue(TokenKind::TwoFactor, &user.email).await?;
                    self.mailer
                        .send_two_factor_email(&user.email, &token.token)
                        .await?;
                    return Ok(SignInOutcome::TwoFactorChallenge);
                }
                Some(code) => {
                    let token = ledger
                        .find_for_email(TokenKind::TwoFactor, &user.email)
                        .await?
                        .ok_or(AuthError::InvalidCode)?;
                    if !platform::crypto::constant_time_eq(
                        token.token.as_bytes(),
                        code.as_bytes(),
                    ) {
                        return Err(AuthError::InvalidCode);
                    }
                    if token.has_expired() {
                        return Err(AuthError::ExpiredCode);
                    }
                    ledger.consume(TokenKind::TwoFactor, &token.id).await?;

                    // Replace any previous confirmation for this user
                    if let Some(existing) = self
                        .confirmation_repo
                        .confirmation_for_user(&user.user_id)
                        .await?
                    {
                        self.confirmation_repo.discard(&existing.id).await?;
                    }
                    self.confirmation_repo
                        .record(&TwoFactorConfirmation::new(user.user_id))
                        .await?;
                }
            }
        }

        let csrf_token = Uuid::new_v4().to_string();
        let rules = RuleSet::pack(&rules_for(user.role, &user.user_id));
        let signed = self
            .jwt
            .issue(user.user_id.into_uuid(), user.email.as_str(), &csrf_token, rules)?;

        tracing::info!(user_id = %user.user_id, "user signed in");

        Ok(SignInOutcome::Session(SessionIssued {
            access_token: signed.token,
            csrf_token,
            expires_in: self.config.access_token_ttl_secs,
            user_id: user.user_id.into_uuid(),
            role: user.role,
            is_two_factor_enabled: user.is_two_factor_enabled,
        }))
    }

    /// Verification emails are dispatched in the background; the caller's
    /// response does not wait on the mail provider.
    fn dispatch_verification_email(&self, email: Email, token: String) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_verification_email(&email, &token).await {
                tracing::warn!(email = %email, error = %e, "verification email dispatch failed");
            }
        });
    }
}
