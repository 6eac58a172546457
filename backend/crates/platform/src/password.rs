//! Password Hashing and Verification
//!
//! bcrypt-backed password handling with:
//! - Salted adaptive hashing (cost factor 12)
//! - Zeroization of sensitive data
//! - Unicode NFKC normalization before validation
//!
//! ## Security Features
//! - Per-password random salt, handled by bcrypt itself
//! - Zeroization prevents memory inspection attacks
//! - Debug output is redacted

use std::fmt;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in bytes (bcrypt input limit)
pub const MAX_PASSWORD_BYTES: usize = 72;

/// bcrypt cost factor
pub const BCRYPT_COST: u32 = 12;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password is too long
    #[error("Password must be at most {max} bytes (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Password contains only whitespace
    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Password contains invalid characters (control characters)
    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    /// Password is missing a required character class
    #[error("Password must contain an uppercase letter, a lowercase letter, a digit and a symbol")]
    MissingCharacterClass,
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// This type ensures that password data is securely erased from memory
/// when the value is dropped, preventing memory inspection attacks.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new clear text password with policy validation
    ///
    /// Validation rules:
    /// - Minimum 8 characters (Unicode code points)
    /// - Maximum 72 bytes (bcrypt input limit)
    /// - No control characters
    /// - At least one uppercase letter, lowercase letter, digit and symbol
    ///
    /// Unicode is normalized using NFKC before validation.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        // Count Unicode code points, not bytes
        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        // bcrypt ignores input past 72 bytes, so reject instead of truncating
        if normalized.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_BYTES,
                actual: normalized.len(),
            });
        }

        for ch in normalized.chars() {
            if ch.is_control() {
                return Err(PasswordPolicyError::InvalidCharacter);
            }
        }

        let has_upper = normalized.chars().any(|c| c.is_uppercase());
        let has_lower = normalized.chars().any(|c| c.is_lowercase());
        let has_digit = normalized.chars().any(|c| c.is_ascii_digit());
        let has_symbol = normalized.chars().any(|c| !c.is_alphanumeric());
        if !(has_upper && has_lower && has_digit && has_symbol) {
            return Err(PasswordPolicyError::MissingCharacterClass);
        }

        Ok(Self(normalized))
    }

    /// Hash this password with bcrypt (cost 12, random salt)
    pub fn hash(&self) -> Result<HashedPassword, PasswordHashError> {
        let hashed = bcrypt::hash(self.0.as_bytes(), BCRYPT_COST)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;
        Ok(HashedPassword(hashed))
    }

    /// Access the raw string for verification
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (for storage)
// ============================================================================

/// Hashed password in bcrypt modular crypt format (`$2b$12$...`)
///
/// Safe to store in the database and to log in redacted form.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Create from a stored hash string (from database)
    pub fn from_hash_string(hash: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = hash.into();
        // bcrypt hashes are 59-60 chars and start with the $2 prefix
        if !hash.starts_with("$2") || hash.len() < 59 {
            return Err(PasswordHashError::InvalidHashFormat);
        }
        Ok(Self(hash))
    }

    /// Get the hash string for database storage
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify a clear text password against this hash
    ///
    /// Returns `false` both on mismatch and on a malformed stored hash;
    /// the caller cannot distinguish the two by timing.
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        bcrypt::verify(password.as_str().as_bytes(), &self.0).unwrap_or(false)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
