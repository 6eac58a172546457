//! Two-Factor Confirmation Entity
//!
//! Audit record written when a two-factor code has been redeemed. At most one
//! confirmation exists per user; a new sign-in replaces the previous one.

use chrono::{DateTime, Utc};
use kernel::id::{ConfirmationId, UserId};

#[derive(Debug, Clone)]
pub struct TwoFactorConfirmation {
    pub id: ConfirmationId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl TwoFactorConfirmation {
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: ConfirmationId::new(),
            user_id,
            created_at: Utc::now(),
        }
    }
}
