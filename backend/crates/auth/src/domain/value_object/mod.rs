pub mod email;
pub mod role_name;
pub mod token_kind;
pub mod user_password;
