//! Auth Configuration

use chrono::Duration;
use platform::cookie::{CookieConfig, SameSite};

use crate::domain::value_object::token_kind::TokenKind;

/// Configuration for session issuance, token lifetimes and outbound links
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens
    pub token_secret: Vec<u8>,
    /// Session token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Email verification token lifetime in seconds
    pub verification_token_ttl_secs: i64,
    /// Password reset token lifetime in seconds
    pub password_reset_token_ttl_secs: i64,
    /// Two-factor code lifetime in seconds
    pub two_factor_token_ttl_secs: i64,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Whether the session cookie requires HTTPS
    pub cookie_secure: bool,
    /// Base URL used in emailed verification and reset links
    pub app_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: Vec::new(),
            access_token_ttl_secs: 3600,
            verification_token_ttl_secs: 900,
            password_reset_token_ttl_secs: 900,
            two_factor_token_ttl_secs: 300,
            cookie_name: "access_token".to_string(),
            cookie_secure: true,
            app_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AuthConfig {
    /// Development configuration with a throwaway random secret
    pub fn development() -> Self {
        Self {
            token_secret: platform::crypto::random_bytes(32),
            cookie_secure: false,
            ..Self::default()
        }
    }

    /// Token lifetime for a given kind
    pub fn ttl_for(&self, kind: TokenKind) -> Duration {
        let secs = match kind {
            TokenKind::EmailVerification => self.verification_token_ttl_secs,
            TokenKind::PasswordReset => self.password_reset_token_ttl_secs,
            TokenKind::TwoFactor => self.two_factor_token_ttl_secs,
        };
        Duration::seconds(secs)
    }

    /// Cookie settings for the session cookie
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: Some(self.access_token_ttl_secs),
        }
    }
}
