use std::fmt;

/// The three kinds of single-use tokens the ledger manages.
///
/// Each kind lives in its own storage table and carries its own lifetime,
/// but all of them follow the same one-active-token-per-email rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EmailVerification,
    PasswordReset,
    TwoFactor,
}

impl TokenKind {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenKind::EmailVerification => "email_verification",
            TokenKind::PasswordReset => "password_reset",
            TokenKind::TwoFactor => "two_factor",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
