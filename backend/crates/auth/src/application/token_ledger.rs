//! Token Ledger
//!
//! Issues and redeems single-use tokens with a one-active-token-per-email
//! rule: issuing deletes any previous token of the same kind before creating
//! the replacement. Delete and create are separate statements: under a
//! concurrent double-issue the last writer wins and the earlier token value
//! stops resolving.

use std::sync::Arc;

use kernel::id::TokenId;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::ephemeral_token::EphemeralToken;
use crate::domain::repository::TokenRepository;
use crate::domain::value_object::{email::Email, token_kind::TokenKind};
use crate::error::AuthResult;

/// Length of two-factor codes in digits
const TWO_FACTOR_CODE_DIGITS: u32 = 6;

pub struct TokenLedger<T: TokenRepository> {
    repo: Arc<T>,
    config: Arc<AuthConfig>,
}

impl<T: TokenRepository> TokenLedger<T> {
    pub fn new(repo: Arc<T>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Issue a fresh token for an email, replacing any active one
    pub async fn issue(&self, kind: TokenKind, email: &Email) -> AuthResult<EphemeralToken> {
        if let Some(existing) = self.repo.active_for_email(kind, email).await? {
            self.repo.remove(kind, &existing.id).await?;
        }

        let value = match kind {
            TokenKind::TwoFactor => {
                platform::crypto::random_numeric_code(TWO_FACTOR_CODE_DIGITS)
            }
            TokenKind::EmailVerification | TokenKind::PasswordReset => {
                Uuid::new_v4().to_string()
            }
        };

        let token = EphemeralToken::new(kind, email.clone(), value, self.config.ttl_for(kind));
        self.repo.insert(&token).await?;

        tracing::debug!(kind = %kind, email = %email, "issued ephemeral token");
        Ok(token)
    }

    /// Look up a token by its opaque value
    pub async fn find(&self, kind: TokenKind, value: &str) -> AuthResult<Option<EphemeralToken>> {
        self.repo.lookup(kind, value).await
    }

    /// Look up the active token for an email
    pub async fn find_for_email(
        &self,
        kind: TokenKind,
        email: &Email,
    ) -> AuthResult<Option<EphemeralToken>> {
        self.repo.active_for_email(kind, email).await
    }

    /// Consume a token after successful redemption
    pub async fn consume(&self, kind: TokenKind, id: &TokenId) -> AuthResult<()> {
        self.repo.remove(kind, id).await
    }
}
