//! Outbound Email Port
//!
//! Interface for the transactional emails the auth flows send.
//! Implementations live in the infrastructure layer.

use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

#[trait_variant::make(EmailSender: Send)]
pub trait LocalEmailSender {
    /// Send the email verification link
    async fn send_verification_email(&self, email: &Email, token: &str) -> AuthResult<()>;

    /// Send the password reset link
    async fn send_password_reset_email(&self, email: &Email, token: &str) -> AuthResult<()>;

    /// Send the two-factor sign-in code
    async fn send_two_factor_email(&self, email: &Email, code: &str) -> AuthResult<()>;
}
