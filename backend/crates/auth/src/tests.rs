//! Flow tests over in-memory repositories
//!
//! Exercise the use cases and the HTTP gate end to end without PostgreSQL
//! or a mail provider.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use tower::util::ServiceExt;
use uuid::Uuid;

use kernel::id::{ConfirmationId, TokenId, UserId};

use crate::application::config::AuthConfig;
use crate::application::forgot_password::ForgotPasswordUseCase;
use crate::application::mailer::EmailSender;
use crate::application::reset_password::{ResetPasswordInput, ResetPasswordUseCase};
use crate::application::sign_in::{SignInInput, SignInOutcome, SignInUseCase};
use crate::application::sign_up::{SignUpInput, SignUpUseCase};
use crate::application::token_ledger::TokenLedger;
use crate::application::verify_email::VerifyEmailUseCase;
use crate::domain::entity::{
    ephemeral_token::EphemeralToken, two_factor_confirmation::TwoFactorConfirmation, user::User,
};
use crate::domain::repository::{ConfirmationRepository, TokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, token_kind::TokenKind,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};
use crate::infra::jwt::JwtIssuer;
use crate::presentation::router::auth_router_generic;

// ============================================================================
// In-Memory Repository
// ============================================================================

#[derive(Default)]
struct MemInner {
    users: HashMap<Uuid, User>,
    tokens: Vec<EphemeralToken>,
    confirmations: Vec<TwoFactorConfirmation>,
}

#[derive(Clone, Default)]
struct MemStore {
    inner: Arc<Mutex<MemInner>>,
}

impl MemStore {
    fn insert_user(&self, user: User) {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(user.user_id.into_uuid(), user);
    }

    fn tokens_of(&self, kind: TokenKind) -> Vec<EphemeralToken> {
        self.inner
            .lock()
            .unwrap()
            .tokens
            .iter()
            .filter(|t| t.kind == kind)
            .cloned()
            .collect()
    }

    fn confirmations_for(&self, user_id: &UserId) -> usize {
        self.inner
            .lock()
            .unwrap()
            .confirmations
            .iter()
            .filter(|c| c.user_id == *user_id)
            .count()
    }

    /// Push every token of a kind past its expiry
    fn expire_tokens(&self, kind: TokenKind) {
        let mut inner = self.inner.lock().unwrap();
        for token in inner.tokens.iter_mut().filter(|t| t.kind == kind) {
            token.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}

impl UserRepository for MemStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.insert_user(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(user_id.as_uuid()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn find_all(&self) -> AuthResult<Vec<User>> {
        Ok(self.inner.lock().unwrap().users.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        self.insert_user(user.clone());
        Ok(())
    }
}

impl TokenRepository for MemStore {
    async fn insert(&self, token: &EphemeralToken) -> AuthResult<()> {
        self.inner.lock().unwrap().tokens.push(token.clone());
        Ok(())
    }

    async fn lookup(&self, kind: TokenKind, value: &str) -> AuthResult<Option<EphemeralToken>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .tokens
            .iter()
            .find(|t| t.kind == kind && t.token == value)
            .cloned())
    }

    async fn active_for_email(
        &self,
        kind: TokenKind,
        email: &Email,
    ) -> AuthResult<Option<EphemeralToken>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .tokens
            .iter()
            .find(|t| t.kind == kind && t.email == *email)
            .cloned())
    }

    async fn remove(&self, kind: TokenKind, id: &TokenId) -> AuthResult<()> {
        self.inner
            .lock()
            .unwrap()
            .tokens
            .retain(|t| !(t.kind == kind && t.id == *id));
        Ok(())
    }
}

impl ConfirmationRepository for MemStore {
    async fn record(&self, confirmation: &TwoFactorConfirmation) -> AuthResult<()> {
        self.inner
            .lock()
            .unwrap()
            .confirmations
            .push(confirmation.clone());
        Ok(())
    }

    async fn confirmation_for_user(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<TwoFactorConfirmation>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .confirmations
            .iter()
            .find(|c| c.user_id == *user_id)
            .cloned())
    }

    async fn discard(&self, id: &ConfirmationId) -> AuthResult<()> {
        self.inner
            .lock()
            .unwrap()
            .confirmations
            .retain(|c| c.id != *id);
        Ok(())
    }
}

// ============================================================================
// Recording Mailer
// ============================================================================

#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<(&'static str, String, String)>>>,
}

impl RecordingMailer {
    fn sent_of(&self, kind: &str) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, email, value)| (email.clone(), value.clone()))
            .collect()
    }
}

impl EmailSender for RecordingMailer {
    async fn send_verification_email(&self, email: &Email, token: &str) -> AuthResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push(("verification", email.to_string(), token.to_string()));
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &Email, token: &str) -> AuthResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push(("reset", email.to_string(), token.to_string()));
        Ok(())
    }

    async fn send_two_factor_email(&self, email: &Email, code: &str) -> AuthResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push(("two_factor", email.to_string(), code.to_string()));
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const PASSWORD: &str = "Aa1!aaaa";

struct Env {
    store: Arc<MemStore>,
    mailer: RecordingMailer,
    jwt: Arc<JwtIssuer>,
    config: Arc<AuthConfig>,
}

impl Env {
    fn new() -> Self {
        let config = AuthConfig::development();
        let jwt = Arc::new(JwtIssuer::from_config(&config).unwrap());
        Self {
            store: Arc::new(MemStore::default()),
            mailer: RecordingMailer::default(),
            jwt,
            config: Arc::new(config),
        }
    }

    fn add_user(&self, email: &str, verified: bool, two_factor: bool) -> User {
        let raw = RawPassword::new(PASSWORD.to_string()).unwrap();
        let hash = UserPassword::from_raw(&raw).unwrap();
        let mut user = User::new(Email::new(email).unwrap(), "tester".to_string(), hash);
        if verified {
            user.mark_verified();
        }
        user.is_two_factor_enabled = two_factor;
        self.store.insert_user(user.clone());
        user
    }

    fn sign_in_use_case(
        &self,
    ) -> SignInUseCase<MemStore, MemStore, MemStore, RecordingMailer> {
        SignInUseCase::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.mailer.clone(),
            self.jwt.clone(),
            self.config.clone(),
        )
    }

    async fn sign_in(&self, email: &str, password: &str, code: Option<&str>) -> AuthResult<SignInOutcome> {
        self.sign_in_use_case()
            .execute(SignInInput {
                email: email.to_string(),
                password: password.to_string(),
                code: code.map(str::to_string),
            })
            .await
    }
}

fn session(outcome: SignInOutcome) -> crate::application::sign_in::SessionIssued {
    match outcome {
        SignInOutcome::Session(session) => session,
        SignInOutcome::TwoFactorChallenge => panic!("expected session, got 2FA challenge"),
    }
}

// ============================================================================
// Sign In
// ============================================================================

#[tokio::test]
async fn sign_in_issues_session_with_matching_csrf() {
    let env = Env::new();
    let user = env.add_user("user@example.com", true, false);

    let session = session(env.sign_in("user@example.com", PASSWORD, None).await.unwrap());

    assert_eq!(session.user_id, user.user_id.into_uuid());
    assert_eq!(session.expires_in, 3600);

    let claims = env.jwt.verify(&session.access_token).unwrap();
    assert_eq!(claims.sub, user.user_id.into_uuid());
    assert_eq!(claims.csrf_token, session.csrf_token);
    assert!(claims.permissions.unpack().is_some());
}

#[tokio::test]
async fn sign_in_rejects_wrong_password_and_unknown_email() {
    let env = Env::new();
    env.add_user("user@example.com", true, false);

    assert!(matches!(
        env.sign_in("user@example.com", "Bb2@bbbb", None).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        env.sign_in("nobody@example.com", PASSWORD, None).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn unverified_account_gets_fresh_verification_token() {
    let env = Env::new();
    env.add_user("user@example.com", false, false);

    assert!(matches!(
        env.sign_in("user@example.com", PASSWORD, None).await,
        Err(AuthError::PendingVerification)
    ));
    assert_eq!(env.store.tokens_of(TokenKind::EmailVerification).len(), 1);
}

// ============================================================================
// Two-Factor
// ============================================================================

#[tokio::test]
async fn two_factor_round_trip() {
    let env = Env::new();
    let user = env.add_user("user@example.com", true, true);

    let outcome = env.sign_in("user@example.com", PASSWORD, None).await.unwrap();
    assert!(matches!(outcome, SignInOutcome::TwoFactorChallenge));

    let sent = env.mailer.sent_of("two_factor");
    assert_eq!(sent.len(), 1);
    let code = sent[0].1.clone();
    assert_eq!(code.len(), 6);

    let session = session(
        env.sign_in("user@example.com", PASSWORD, Some(&code)).await.unwrap(),
    );
    assert!(session.is_two_factor_enabled);

    // Code is consumed and a confirmation recorded
    assert!(env.store.tokens_of(TokenKind::TwoFactor).is_empty());
    assert_eq!(env.store.confirmations_for(&user.user_id), 1);
}

#[tokio::test]
async fn reissued_two_factor_code_invalidates_previous() {
    let env = Env::new();
    env.add_user("user@example.com", true, true);

    env.sign_in("user@example.com", PASSWORD, None).await.unwrap();
    let first_code = env.mailer.sent_of("two_factor")[0].1.clone();

    env.sign_in("user@example.com", PASSWORD, None).await.unwrap();
    assert_eq!(env.store.tokens_of(TokenKind::TwoFactor).len(), 1);

    let second_code = env.mailer.sent_of("two_factor")[1].1.clone();
    if first_code != second_code {
        assert!(matches!(
            env.sign_in("user@example.com", PASSWORD, Some(&first_code)).await,
            Err(AuthError::InvalidCode)
        ));
    }
    session(
        env.sign_in("user@example.com", PASSWORD, Some(&second_code))
            .await
            .unwrap(),
    );
}

#[tokio::test]
async fn expired_two_factor_code_is_rejected() {
    let env = Env::new();
    env.add_user("user@example.com", true, true);

    env.sign_in("user@example.com", PASSWORD, None).await.unwrap();
    let code = env.mailer.sent_of("two_factor")[0].1.clone();
    env.store.expire_tokens(TokenKind::TwoFactor);

    assert!(matches!(
        env.sign_in("user@example.com", PASSWORD, Some(&code)).await,
        Err(AuthError::ExpiredCode)
    ));
}

// ============================================================================
// Token Ledger
// ============================================================================

#[tokio::test]
async fn ledger_keeps_single_active_token() {
    let env = Env::new();
    let email = Email::new("user@example.com").unwrap();
    let ledger = TokenLedger::new(env.store.clone(), env.config.clone());

    let first = ledger.issue(TokenKind::PasswordReset, &email).await.unwrap();
    let second = ledger.issue(TokenKind::PasswordReset, &email).await.unwrap();

    assert_eq!(env.store.tokens_of(TokenKind::PasswordReset).len(), 1);
    assert!(ledger
        .find(TokenKind::PasswordReset, &first.token)
        .await
        .unwrap()
        .is_none());
    assert!(ledger
        .find(TokenKind::PasswordReset, &second.token)
        .await
        .unwrap()
        .is_some());
}

// ============================================================================
// Sign Up + Email Verification
// ============================================================================

#[tokio::test]
async fn sign_up_then_verify_then_sign_in() {
    let env = Env::new();
    let sign_up = SignUpUseCase::new(
        env.store.clone(),
        env.store.clone(),
        env.mailer.clone(),
        env.config.clone(),
    );

    sign_up
        .execute(SignUpInput {
            email: "new@example.com".to_string(),
            username: "newbie".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    // Duplicate registration is a conflict
    assert!(matches!(
        sign_up
            .execute(SignUpInput {
                email: "new@example.com".to_string(),
                username: "other".to_string(),
                password: PASSWORD.to_string(),
            })
            .await,
        Err(AuthError::EmailTaken)
    ));

    // Not signed in yet until the emailed token is redeemed
    assert!(matches!(
        env.sign_in("new@example.com", PASSWORD, None).await,
        Err(AuthError::PendingVerification)
    ));

    let token = env.store.tokens_of(TokenKind::EmailVerification)[0].token.clone();
    let verify = VerifyEmailUseCase::new(env.store.clone(), env.store.clone(), env.config.clone());
    verify.execute(&token).await.unwrap();

    session(env.sign_in("new@example.com", PASSWORD, None).await.unwrap());
    assert!(env.store.tokens_of(TokenKind::EmailVerification).is_empty());
}

#[tokio::test]
async fn expired_verification_token_is_rejected_but_kept() {
    let env = Env::new();
    env.add_user("user@example.com", false, false);

    let _ = env.sign_in("user@example.com", PASSWORD, None).await;
    let token = env.store.tokens_of(TokenKind::EmailVerification)[0].token.clone();
    env.store.expire_tokens(TokenKind::EmailVerification);

    let verify = VerifyEmailUseCase::new(env.store.clone(), env.store.clone(), env.config.clone());
    assert!(matches!(verify.execute(&token).await, Err(AuthError::TokenExpired)));

    // Expired token stays until a sign-in issues its replacement
    assert_eq!(env.store.tokens_of(TokenKind::EmailVerification).len(), 1);

    assert!(matches!(verify.execute("").await, Err(AuthError::MissingToken)));
    assert!(matches!(
        verify.execute("no-such-token").await,
        Err(AuthError::TokenNotFound)
    ));
}

// ============================================================================
// Password Reset
// ============================================================================

#[tokio::test]
async fn password_reset_flow() {
    let env = Env::new();
    env.add_user("user@example.com", true, false);

    let forgot = ForgotPasswordUseCase::new(
        env.store.clone(),
        env.store.clone(),
        env.mailer.clone(),
        env.config.clone(),
    );
    assert!(matches!(
        forgot.execute("nobody@example.com").await,
        Err(AuthError::EmailNotFound)
    ));
    forgot.execute("user@example.com").await.unwrap();

    let sent = env.mailer.sent_of("reset");
    assert_eq!(sent.len(), 1);
    let token = sent[0].1.clone();

    let reset = ResetPasswordUseCase::new(env.store.clone(), env.store.clone(), env.config.clone());
    reset
        .execute(ResetPasswordInput {
            token: token.clone(),
            password: "Cc3#cccc".to_string(),
        })
        .await
        .unwrap();

    // Old password dead, new one works, token single-use
    assert!(matches!(
        env.sign_in("user@example.com", PASSWORD, None).await,
        Err(AuthError::InvalidCredentials)
    ));
    session(env.sign_in("user@example.com", "Cc3#cccc", None).await.unwrap());
    assert!(matches!(
        reset
            .execute(ResetPasswordInput {
                token,
                password: "Dd4$dddd".to_string(),
            })
            .await,
        Err(AuthError::TokenNotFound)
    ));
}

// ============================================================================
// HTTP Gate
// ============================================================================

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn gate_requires_cookie_and_matching_csrf_header() {
    let env = Env::new();
    env.add_user("user@example.com", true, false);
    let app = auth_router_generic(
        (*env.store).clone(),
        env.mailer.clone(),
        (*env.config).clone(),
    )
    .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/sign-in",
            serde_json::json!({"email": "user@example.com", "password": PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let csrf = response
        .headers()
        .get("x-csrf-token")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let body = response_json(response).await;
    assert_eq!(body["csrf_token"].as_str().unwrap(), csrf);
    assert_eq!(body["expiresIn"].as_i64().unwrap(), 3600);

    // No credentials at all
    let bare = Request::builder()
        .method("GET")
        .uri("/users/me")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(bare).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Cookie with a mismatched CSRF header
    let mismatched = Request::builder()
        .method("GET")
        .uri("/users/me")
        .header(header::COOKIE, &cookie)
        .header("x-csrf-token", "not-the-csrf-value")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(mismatched).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Matching pair passes the gate
    let authed = Request::builder()
        .method("GET")
        .uri("/users/me")
        .header(header::COOKIE, &cookie)
        .header("x-csrf-token", &csrf)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(authed).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["email"].as_str().unwrap(), "user@example.com");

    // Moderator rules grant (Read, User), so listing passes the ability table
    let listing = Request::builder()
        .method("GET")
        .uri("/users")
        .header(header::COOKIE, &cookie)
        .header("x-csrf-token", &csrf)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(listing).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn gate_forbids_unsatisfied_ability_table() {
    use crate::domain::permissions::{Ability, Action, Subject, RuleSet, rules_for};
    use crate::domain::value_object::role_name::RoleName;
    use crate::presentation::middleware::{CurrentUser, require_ability};
    use axum::middleware::from_fn;
    use axum::routing::get;

    const NEEDS_USER_DELETE: &[(Action, Subject)] = &[(Action::Delete, Subject::User)];

    let env = Env::new();
    let user = env.add_user("user@example.com", true, false);
    let ability = Ability::new(
        RuleSet::pack(&rules_for(RoleName::Moderator, &user.user_id))
            .unpack()
            .unwrap(),
    );

    // Injects the extensions the authenticate gate would have attached
    let inject_user = user.clone();
    let app = axum::Router::new()
        .route("/protected", get(|| async { "ok" }))
        .layer(from_fn(move |req, next| {
            require_ability(NEEDS_USER_DELETE, req, next)
        }))
        .layer(from_fn(move |mut req: Request<Body>, next: axum::middleware::Next| {
            let user = inject_user.clone();
            let ability = ability.clone();
            async move {
                req.extensions_mut().insert(CurrentUser(user));
                req.extensions_mut().insert(ability);
                next.run(req).await
            }
        }));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/protected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
