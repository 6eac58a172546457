//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::{ConfirmationId, TokenId, UserId};

use crate::domain::entity::{
    ephemeral_token::EphemeralToken, two_factor_confirmation::TwoFactorConfirmation, user::User,
};
use crate::domain::value_object::{email::Email, token_kind::TokenKind};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Check if email is already registered
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// List all users
    async fn find_all(&self) -> AuthResult<Vec<User>>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;
}

/// Ephemeral token repository trait
///
/// Absent tokens are reported as `None`, never as an error.
#[trait_variant::make(TokenRepository: Send)]
pub trait LocalTokenRepository {
    /// Persist a freshly issued token
    async fn insert(&self, token: &EphemeralToken) -> AuthResult<()>;

    /// Find a token of the given kind by its opaque value
    async fn lookup(&self, kind: TokenKind, value: &str) -> AuthResult<Option<EphemeralToken>>;

    /// Find the active token of the given kind for an email
    async fn active_for_email(
        &self,
        kind: TokenKind,
        email: &Email,
    ) -> AuthResult<Option<EphemeralToken>>;

    /// Delete a token by ID
    async fn remove(&self, kind: TokenKind, id: &TokenId) -> AuthResult<()>;
}

/// Two-factor confirmation repository trait
#[trait_variant::make(ConfirmationRepository: Send)]
pub trait LocalConfirmationRepository {
    /// Persist a confirmation record
    async fn record(&self, confirmation: &TwoFactorConfirmation) -> AuthResult<()>;

    /// Find the confirmation for a user, if any
    async fn confirmation_for_user(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<TwoFactorConfirmation>>;

    /// Delete a confirmation by ID
    async fn discard(&self, id: &ConfirmationId) -> AuthResult<()>;
}
