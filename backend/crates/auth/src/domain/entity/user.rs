//! User Entity
//!
//! User account with credentials, verification state and role.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{
    email::Email, role_name::RoleName, user_password::UserPassword,
};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Email address (unique, used for sign-in)
    pub email: Email,
    /// Display name
    pub username: String,
    /// Bcrypt password hash
    pub password_hash: UserPassword,
    /// Set once the emailed verification token has been redeemed
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Whether sign-in requires an emailed one-time code
    pub is_two_factor_enabled: bool,
    pub role: RoleName,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new unverified user with the default role
    pub fn new(email: Email, username: String, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            username,
            password_hash,
            email_verified_at: None,
            is_two_factor_enabled: false,
            role: RoleName::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Record a redeemed email verification
    pub fn mark_verified(&mut self) {
        let now = Utc::now();
        self.email_verified_at = Some(now);
        self.updated_at = now;
    }

    /// Replace the stored password hash
    pub fn set_password(&mut self, password_hash: UserPassword) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }

    pub fn set_role(&mut self, role: RoleName) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    pub fn set_two_factor_enabled(&mut self, enabled: bool) {
        self.is_two_factor_enabled = enabled;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn sample_user() -> User {
        let email = Email::new("user@example.com").unwrap();
        let raw = RawPassword::new("Aa1!aaaa".to_string()).unwrap();
        let hash = UserPassword::from_raw(&raw).unwrap();
        User::new(email, "user".to_string(), hash)
    }

    #[test]
    fn new_user_starts_unverified_with_default_role() {
        let user = sample_user();
        assert!(!user.is_verified());
        assert!(!user.is_two_factor_enabled);
        assert_eq!(user.role, RoleName::Moderator);
    }

    #[test]
    fn mark_verified_sets_timestamp() {
        let mut user = sample_user();
        user.mark_verified();
        assert!(user.is_verified());
        assert!(user.updated_at >= user.created_at);
    }
}
