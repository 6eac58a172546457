pub mod ephemeral_token;
pub mod two_factor_confirmation;
pub mod user;
