//! Ephemeral Token Entity
//!
//! A short-lived single-use token tied to an email address. Covers email
//! verification links, password reset links and two-factor codes.

use chrono::{DateTime, Duration, Utc};
use kernel::id::TokenId;

use crate::domain::value_object::{email::Email, token_kind::TokenKind};

#[derive(Debug, Clone)]
pub struct EphemeralToken {
    pub id: TokenId,
    pub kind: TokenKind,
    /// Email the token was issued for
    pub email: Email,
    /// Opaque token value (UUID for links, 6-digit code for 2FA)
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl EphemeralToken {
    pub fn new(kind: TokenKind, email: Email, token: String, ttl: Duration) -> Self {
        Self {
            id: TokenId::new(),
            kind,
            email,
            token,
            expires_at: Utc::now() + ttl,
        }
    }

    /// Expiry is checked at redemption time, never at lookup time
    pub fn has_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
