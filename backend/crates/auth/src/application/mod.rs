pub mod config;
pub mod forgot_password;
pub mod mailer;
pub mod reset_password;
pub mod sign_in;
pub mod sign_up;
pub mod token_ledger;
pub mod verify_email;
