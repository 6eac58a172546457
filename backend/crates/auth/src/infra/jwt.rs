//! Session Token Issuance
//!
//! HS256-signed JWTs carrying the user identity, a CSRF pairing value and
//! the packed permission rules.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::permissions::RuleSet;

/// Allowed clock skew when validating expiry, in seconds
const VALIDATION_LEEWAY_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Signing secret is not configured")]
    MissingSecret,

    #[error("Token is invalid")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    Encode(String),
}

/// Claims carried inside the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub email: String,
    /// Pairing value the client must echo in the CSRF header
    pub csrf_token: String,
    /// Packed permission rules, snapshotted at sign-in
    pub permissions: RuleSet,
    pub iat: i64,
    pub exp: i64,
}

/// A signed token together with its expiry
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn from_config(config: &AuthConfig) -> Result<Self, JwtError> {
        if config.token_secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = VALIDATION_LEEWAY_SECS;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&config.token_secret),
            decoding_key: DecodingKey::from_secret(&config.token_secret),
            validation,
            ttl: Duration::seconds(config.access_token_ttl_secs),
        })
    }

    /// Issue a signed session token
    pub fn issue(
        &self,
        sub: Uuid,
        email: &str,
        csrf_token: &str,
        permissions: RuleSet,
    ) -> Result<SignedToken, JwtError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub,
            email: email.to_string(),
            csrf_token: csrf_token.to_string(),
            permissions,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encode(e.to_string()))?;

        Ok(SignedToken { token, expires_at })
    }

    /// Verify a token's signature and expiry and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }
}
