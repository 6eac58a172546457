use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum RoleName {
    /// Default role for newly registered users
    #[default]
    Moderator = 0,
    Admin = 1,
}

impl RoleName {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            RoleName::Moderator => "moderator",
            RoleName::Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, RoleName::Admin)
    }

    #[inline]
    pub fn from_id(id: i16) -> Self {
        match id {
            0 => RoleName::Moderator,
            1 => RoleName::Admin,
            _ => {
                tracing::error!("Invalid RoleName id: {}", id);
                unreachable!("Invalid RoleName id: {}", id)
            }
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
