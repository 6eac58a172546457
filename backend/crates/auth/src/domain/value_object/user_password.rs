//! User Password Value Object
//!
//! Domain wrapper around `platform::password`. `RawPassword` carries a
//! validated cleartext password from user input (zeroized on drop) and
//! `UserPassword` carries a stored bcrypt hash.

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

/// Raw password from user input
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Create a new raw password, enforcing the password policy
    pub fn new(raw: String) -> AppResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| match e {
            PasswordPolicyError::TooShort { .. }
            | PasswordPolicyError::TooLong { .. }
            | PasswordPolicyError::EmptyOrWhitespace
            | PasswordPolicyError::InvalidCharacter
            | PasswordPolicyError::MissingCharacterClass => AppError::bad_request(e.to_string()),
        })?;
        Ok(Self(clear_text))
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPassword(REDACTED)")
    }
}

/// Hashed password as stored on the user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a validated raw password for storage
    pub fn from_raw(raw: &RawPassword) -> AppResult<Self> {
        let hashed = raw
            .0
            .hash()
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
        Ok(Self(hashed))
    }

    /// Rehydrate from a database value
    pub fn from_hash_string(hash: impl Into<String>) -> AppResult<Self> {
        let hashed = HashedPassword::from_hash_string(hash)
            .map_err(|_| AppError::internal("Stored password hash is malformed"))?;
        Ok(Self(hashed))
    }

    /// Verify a raw password against the stored hash
    pub fn verify(&self, raw: &RawPassword) -> bool {
        self.0.verify(&raw.0)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let raw = RawPassword::new("Aa1!aaaa".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw).unwrap();
        assert!(hashed.verify(&raw));

        let other = RawPassword::new("Bb2@bbbb".to_string()).unwrap();
        assert!(!hashed.verify(&other));
    }

    #[test]
    fn policy_violations_become_bad_request() {
        let err = RawPassword::new("short".to_string()).unwrap_err();
        assert!(err.kind().is_client_error());
    }

    #[test]
    fn debug_never_leaks_cleartext() {
        let raw = RawPassword::new("Aa1!aaaa".to_string()).unwrap();
        assert_eq!(format!("{raw:?}"), "RawPassword(REDACTED)");
    }

    #[test]
    fn rejects_malformed_stored_hash() {
        assert!(UserPassword::from_hash_string("not-a-bcrypt-hash").is_err());
    }
}
