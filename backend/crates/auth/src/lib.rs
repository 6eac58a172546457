//! Auth (Authentication and Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, permission rules, repository traits
//! - `application/` - Use cases, token ledger, configuration
//! - `infra/` - Database, JWT and email implementations
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Email + password sign-in with optional emailed two-factor codes
//! - Email verification and password reset via single-use tokens
//! - Stateless sessions: HS256 JWT cookie paired with a CSRF header
//! - Role-derived permission rules packed into the session token
//!
//! ## Security Model
//! - Passwords hashed with bcrypt
//! - One active ephemeral token per email and kind; expiry checked at redemption
//! - Constant-time comparison for CSRF values and two-factor codes
//! - Permission snapshot in the token; role changes apply on next sign-in

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::email::{LogMailer, ResendMailer};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
