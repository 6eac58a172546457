//! Request Gate Middleware
//!
//! `authenticate` resolves the session cookie + CSRF header pair into a
//! `CurrentUser` and an `Ability` snapshot. `require_ability` checks a
//! declarative action/subject table against that snapshot.

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::permissions::{Ability, Action, Subject};
use crate::domain::repository::UserRepository;
use crate::error::AuthError;
use crate::infra::jwt::JwtIssuer;

/// Request header the client echoes the CSRF value in
pub const CSRF_REQUEST_HEADER: &str = "x-csrf-token";

/// Authenticated user attached to the request
#[derive(Clone)]
pub struct CurrentUser(pub User);

/// Middleware state
#[derive(Clone)]
pub struct AuthGateState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub jwt: Arc<JwtIssuer>,
    pub config: Arc<AuthConfig>,
}

/// Middleware that requires a valid session cookie + CSRF header pair
pub async fn authenticate<R>(
    state: AuthGateState<R>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let headers = req.headers();

    let token = platform::cookie::extract_cookie(headers, &state.config.cookie_name);
    let csrf = headers
        .get(CSRF_REQUEST_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let (Some(token), Some(csrf)) = (token, csrf) else {
        return Err(AuthError::MissingCredentials.into_response());
    };

    let claims = state
        .jwt
        .verify(&token)
        .map_err(|e| AuthError::from(e).into_response())?;

    if !platform::crypto::constant_time_eq(claims.csrf_token.as_bytes(), csrf.as_bytes()) {
        tracing::warn!(user_id = %claims.sub, "csrf header does not match session token");
        return Err(AuthError::Unauthorized.into_response());
    }

    let user = state
        .repo
        .find_by_id(&UserId::from_uuid(claims.sub))
        .await
        .map_err(|e| e.into_response())?
        .ok_or_else(|| AuthError::Unauthorized.into_response())?;

    let ability = claims
        .permissions
        .unpack()
        .map(Ability::new)
        .ok_or_else(|| AuthError::Unauthorized.into_response())?;

    req.extensions_mut().insert(CurrentUser(user));
    req.extensions_mut().insert(ability);

    Ok(next.run(req).await)
}

/// Middleware that requires every listed action/subject pair
///
/// Evaluates the rule snapshot packed into the session token at sign-in;
/// role changes apply from the next sign-in.
pub async fn require_ability(
    checks: &'static [(Action, Subject)],
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    if req.extensions().get::<CurrentUser>().is_none() {
        return Err(AuthError::Unauthorized.into_response());
    }
    let Some(ability) = req.extensions().get::<Ability>() else {
        return Err(AuthError::Unauthorized.into_response());
    };

    if !checks
        .iter()
        .all(|(action, subject)| ability.can_subject(*action, *subject))
    {
        return Err(AuthError::Forbidden.into_response());
    }

    Ok(next.run(req).await)
}
