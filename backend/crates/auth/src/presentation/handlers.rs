//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderName, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::mailer::EmailSender;
use crate::application::reset_password::{ResetPasswordInput, ResetPasswordUseCase};
use crate::application::sign_in::{SignInInput, SignInOutcome, SignInUseCase};
use crate::application::sign_up::{SignUpInput, SignUpUseCase};
use crate::application::verify_email::VerifyEmailUseCase;
use crate::application::forgot_password::ForgotPasswordUseCase;
use crate::domain::repository::{ConfirmationRepository, TokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::infra::jwt::JwtIssuer;
use crate::presentation::dto::{
    ForgotPasswordRequest, MessageResponse, ResetPasswordRequest, SignInRequest, SignInResponse,
    SignUpRequest, SignUpResponse, TwoFactorResponse, UserInfoResponse, VerifyEmailRequest,
};
use crate::presentation::middleware::CurrentUser;

/// Response header carrying the CSRF pairing value
pub const CSRF_RESPONSE_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, M>
where
    R: UserRepository + TokenRepository + ConfirmationRepository + Clone + Send + Sync + 'static,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: M,
    pub jwt: Arc<JwtIssuer>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /auth/sign-up
pub async fn sign_up<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + TokenRepository + ConfirmationRepository + Clone + Send + Sync + 'static,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    if req.password != req.confirm_password {
        return Err(AuthError::Validation(
            "Password confirmation does not match".to_string(),
        ));
    }

    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignUpInput {
            email: req.email,
            username: req.username,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "Confirmation email sent".to_string(),
            user_id: output.user_id,
        }),
    ))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /auth/sign-in
pub async fn sign_in<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + TokenRepository + ConfirmationRepository + Clone + Send + Sync + 'static,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.jwt.clone(),
        state.config.clone(),
    );

    let outcome = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
            code: req.code,
        })
        .await?;

    match outcome {
        SignInOutcome::TwoFactorChallenge => {
            Ok(Json(TwoFactorResponse { two_factor: true }).into_response())
        }
        SignInOutcome::Session(session) => {
            let cookie = state
                .config
                .session_cookie()
                .build_set_cookie(&session.access_token);

            let body = SignInResponse {
                csrf_token: session.csrf_token.clone(),
                access_token: session.access_token,
                expires_in: session.expires_in,
                user_id: session.user_id,
                role: session.role.code().to_string(),
                is_two_factor_enabled: session.is_two_factor_enabled,
            };

            Ok((
                [
                    (header::SET_COOKIE, cookie),
                    (CSRF_RESPONSE_HEADER, session.csrf_token),
                ],
                Json(body),
            )
                .into_response())
        }
    }
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /auth/verify-email
pub async fn verify_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: UserRepository + TokenRepository + ConfirmationRepository + Clone + Send + Sync + 'static,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    let use_case =
        VerifyEmailUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    use_case.execute(&req.token).await?;

    Ok(Json(MessageResponse::new("Email verified")))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /auth/forgot-password
pub async fn forgot_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: UserRepository + TokenRepository + ConfirmationRepository + Clone + Send + Sync + 'static,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(&req.email).await?;

    Ok(Json(MessageResponse::new("Reset email sent")))
}

/// PUT /auth/reset-password
pub async fn reset_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: UserRepository + TokenRepository + ConfirmationRepository + Clone + Send + Sync + 'static,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    let use_case =
        ResetPasswordUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    use_case
        .execute(ResetPasswordInput {
            token: req.token,
            password: req.password,
        })
        .await?;

    Ok(Json(MessageResponse::new("Password updated")))
}

// ============================================================================
// Users
// ============================================================================

/// GET /users/me
pub async fn current_user(
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Json<UserInfoResponse> {
    Json(UserInfoResponse::from(&current.0))
}

/// GET /users
pub async fn list_users<R, M>(
    State(state): State<AuthAppState<R, M>>,
) -> AuthResult<Json<Vec<UserInfoResponse>>>
where
    R: UserRepository + TokenRepository + ConfirmationRepository + Clone + Send + Sync + 'static,
    M: EmailSender + Clone + Send + Sync + 'static,
{
    let users = state.repo.find_all().await?;
    Ok(Json(users.iter().map(UserInfoResponse::from).collect()))
}
