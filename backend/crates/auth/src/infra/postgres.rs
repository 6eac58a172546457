//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use kernel::id::{ConfirmationId, TokenId, UserId};

use crate::domain::entity::{
    ephemeral_token::EphemeralToken, two_factor_confirmation::TwoFactorConfirmation, user::User,
};
use crate::domain::repository::{ConfirmationRepository, TokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, role_name::RoleName, token_kind::TokenKind, user_password::UserPassword,
};
use crate::error::AuthResult;

/// Storage table for each token kind
const fn token_table(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::EmailVerification => "verification_tokens",
        TokenKind::PasswordReset => "password_reset_tokens",
        TokenKind::TwoFactor => "two_factor_tokens",
    }
}

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up tokens past their expiry across all three ledgers
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let mut deleted = 0;

        for kind in [
            TokenKind::EmailVerification,
            TokenKind::PasswordReset,
            TokenKind::TwoFactor,
        ] {
            let query = format!("DELETE FROM {} WHERE expires_at < $1", token_table(kind));
            deleted += sqlx::query(&query)
                .bind(now)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }

        tracing::info!(tokens_deleted = deleted, "cleaned up expired tokens");
        Ok(deleted)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                username,
                password_hash,
                email_verified_at,
                is_two_factor_enabled,
                role,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.username)
        .bind(user.password_hash.as_str())
        .bind(user.email_verified_at)
        .bind(user.is_two_factor_enabled)
        .bind(user.role.id())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, email, username, password_hash,
                email_verified_at, is_two_factor_enabled, role,
                created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, email, username, password_hash,
                email_verified_at, is_two_factor_enabled, role,
                created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.0)
    }

    async fn find_all(&self) -> AuthResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, email, username, password_hash,
                email_verified_at, is_two_factor_enabled, role,
                created_at, updated_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_user()).collect()
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                username = $3,
                password_hash = $4,
                email_verified_at = $5,
                is_two_factor_enabled = $6,
                role = $7,
                updated_at = $8
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.username)
        .bind(user.password_hash.as_str())
        .bind(user.email_verified_at)
        .bind(user.is_two_factor_enabled)
        .bind(user.role.id())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Token Repository Implementation
// ============================================================================

impl TokenRepository for PgAuthRepository {
    async fn insert(&self, token: &EphemeralToken) -> AuthResult<()> {
        let query = format!(
            "INSERT INTO {} (id, email, token, expires_at) VALUES ($1, $2, $3, $4)",
            token_table(token.kind)
        );
        sqlx::query(&query)
            .bind(token.id.as_uuid())
            .bind(token.email.as_str())
            .bind(&token.token)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn lookup(&self, kind: TokenKind, value: &str) -> AuthResult<Option<EphemeralToken>> {
        let query = format!(
            "SELECT id, email, token, expires_at FROM {} WHERE token = $1",
            token_table(kind)
        );
        let row = sqlx::query_as::<_, TokenRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_token(kind)))
    }

    async fn active_for_email(
        &self,
        kind: TokenKind,
        email: &Email,
    ) -> AuthResult<Option<EphemeralToken>> {
        let query = format!(
            "SELECT id, email, token, expires_at FROM {} WHERE email = $1",
            token_table(kind)
        );
        let row = sqlx::query_as::<_, TokenRow>(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_token(kind)))
    }

    async fn remove(&self, kind: TokenKind, id: &TokenId) -> AuthResult<()> {
        let query = format!("DELETE FROM {} WHERE id = $1", token_table(kind));
        sqlx::query(&query)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Confirmation Repository Implementation
// ============================================================================

impl ConfirmationRepository for PgAuthRepository {
    async fn record(&self, confirmation: &TwoFactorConfirmation) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO two_factor_confirmations (id, user_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(confirmation.id.as_uuid())
        .bind(confirmation.user_id.as_uuid())
        .bind(confirmation.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn confirmation_for_user(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<TwoFactorConfirmation>> {
        let row = sqlx::query_as::<_, ConfirmationRow>(
            "SELECT id, user_id, created_at FROM two_factor_confirmations WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ConfirmationRow::into_confirmation))
    }

    async fn discard(&self, id: &ConfirmationId) -> AuthResult<()> {
        sqlx::query("DELETE FROM two_factor_confirmations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    username: String,
    password_hash: String,
    email_verified_at: Option<DateTime<Utc>>,
    is_two_factor_enabled: bool,
    role: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            username: self.username,
            password_hash: UserPassword::from_hash_string(self.password_hash)?,
            email_verified_at: self.email_verified_at,
            is_two_factor_enabled: self.is_two_factor_enabled,
            role: RoleName::from_id(self.role),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: Uuid,
    email: String,
    token: String,
    expires_at: DateTime<Utc>,
}

impl TokenRow {
    fn into_token(self, kind: TokenKind) -> EphemeralToken {
        EphemeralToken {
            id: TokenId::from_uuid(self.id),
            kind,
            email: Email::from_db(self.email),
            token: self.token,
            expires_at: self.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ConfirmationRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl ConfirmationRow {
    fn into_confirmation(self) -> TwoFactorConfirmation {
        TwoFactorConfirmation {
            id: ConfirmationId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            created_at: self.created_at,
        }
    }
}
