//! Auth Router
//!
//! Public auth routes plus the protected user routes behind the request
//! gate. Required abilities per route are declared in a table here instead
//! of being scattered through handlers.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::mailer::EmailSender;
use crate::domain::permissions::{Action, Subject};
use crate::domain::repository::{ConfirmationRepository, TokenRepository, UserRepository};
use crate::error::AuthResult;
use crate::infra::email::ResendMailer;
use crate::infra::jwt::JwtIssuer;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthGateState, authenticate, require_ability};

/// Abilities required to list users
const LIST_USERS: &[(Action, Subject)] = &[(Action::Read, Subject::User)];

/// Create the router with PostgreSQL repository and Resend mailer
pub fn auth_router(
    repo: PgAuthRepository,
    mailer: ResendMailer,
    config: AuthConfig,
) -> AuthResult<Router> {
    auth_router_generic(repo, mailer, config)
}

/// Create a generic router for any repository and mailer implementation
pub fn auth_router_generic<R, M>(repo: R, mailer: M, config: AuthConfig) -> AuthResult<Router>
where
    R: UserRepository + TokenRepository + ConfirmationRepository + Clone + Send + Sync + 'static,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    let jwt = Arc::new(JwtIssuer::from_config(&config)?);
    let repo = Arc::new(repo);
    let config = Arc::new(config);

    let state = AuthAppState {
        repo: repo.clone(),
        mailer,
        jwt: jwt.clone(),
        config: config.clone(),
    };
    let gate = AuthGateState { repo, jwt, config };

    let auth_routes = Router::new()
        .route("/sign-up", post(handlers::sign_up::<R, M>))
        .route("/sign-in", post(handlers::sign_in::<R, M>))
        .route("/verify-email", post(handlers::verify_email::<R, M>))
        .route("/forgot-password", post(handlers::forgot_password::<R, M>))
        .route("/reset-password", put(handlers::reset_password::<R, M>))
        .with_state(state.clone());

    let users_routes = Router::new()
        .route(
            "/",
            get(handlers::list_users::<R, M>).layer(middleware::from_fn(
                move |req, next| require_ability(LIST_USERS, req, next),
            )),
        )
        .route("/me", get(handlers::current_user))
        .route_layer(middleware::from_fn(move |req, next| {
            authenticate(gate.clone(), req, next)
        }))
        .with_state(state);

    Ok(Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", users_routes))
}
