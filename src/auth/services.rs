use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn};

use super::{
    access::AccessTokenService,
    claims::SignedToken,
    cookies::CookieSpec,
    dto::RegisterRequest,
    password::{hash_password, verify_password},
    password_reset::PasswordResetService,
    refresh::RefreshTokenService,
    repo::UserStore,
    repo_types::{NewUser, PublicUser, User, UserId},
};
use crate::{
    error::{Description, Error},
    outcome::{FutureOutcomeExt, Outcome, OutcomeExt},
};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_NICKNAME_LEN: usize = 32;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Tokens handed out when a session starts or is refreshed.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub access_token: SignedToken,
    pub refresh_token: SignedToken,
    pub cookie: CookieSpec,
}

/// Registration, login, refresh and password reset on top of the token
/// services.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    access: AccessTokenService,
    refresh: RefreshTokenService,
    reset: PasswordResetService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        access: AccessTokenService,
        refresh: RefreshTokenService,
        reset: PasswordResetService,
    ) -> Self {
        Self {
            users,
            access,
            refresh,
            reset,
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email, nickname = %request.nickname))]
    pub async fn register(&self, request: RegisterRequest) -> Outcome<Session> {
        let request = validate_registration(request)?;
        self.ensure_available(&request.email, &request.nickname)
            .await?;
        // A session must be issuable before the account exists.
        self.access.ensure_configured()?;
        self.refresh.ensure_configured()?;

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                email: request.email,
                nickname: request.nickname,
                password_hash,
            })
            .await?;
        info!(user_id = user.id, "user registered");
        self.start_session(user).await
    }

    /// `login` is treated as an e-mail address when it contains `@`,
    /// otherwise as a nickname.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &str) -> Outcome<Session> {
        self.find_by_login(login, Error::WRONG_LOGIN)
            .then_bind(|user| check_password(user, password))
            .then_bind_async(|user| self.start_session(user))
            .await
    }

    /// Exchanges the current refresh token for a new session; the presented
    /// token stops being valid.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Outcome<Session> {
        self.refresh
            .validate_token(refresh_token)
            .then_bind_async(|user| self.start_session(user))
            .await
    }

    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, login: &str) -> Outcome<()> {
        self.find_by_login(login, Error::WRONG_EMAIL)
            .then_bind_async(|user| self.reset.generate_and_send(user))
            .await
    }

    /// Redeems a reset token and stores the new password. The token is
    /// cleared in the same write as the password, and clearing the stored
    /// refresh token ends existing sessions.
    #[instrument(skip_all)]
    pub async fn complete_reset(&self, token: &str, new_password: &str) -> Outcome<()> {
        validate_password(new_password)?;
        let mut user = self.reset.validate(token).await?;
        user.password_hash = hash_password(new_password)?;
        user.password_reset_token.clear();
        user.refresh_token.clear();
        self.users.save(&user).await?;
        info!(user_id = user.id, "password changed via reset link");
        Ok(())
    }

    pub async fn me(&self, user_id: UserId) -> Outcome<PublicUser> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(Error::WRONG_USER_ID)
            .map(|user| PublicUser::from(&user))
    }

    async fn start_session(&self, user: User) -> Outcome<Session> {
        let access_token = self.access.generate(&user)?;
        let (user, refresh_token) = self.refresh.issue(user).await?;
        Ok(Session {
            user,
            access_token,
            refresh_token,
            cookie: self.refresh.cookie_options(),
        })
    }

    async fn find_by_login(&self, login: &str, missing: Error) -> Outcome<User> {
        let login = login.trim();
        let found = if login.contains('@') {
            self.users.find_by_email(&login.to_lowercase()).await?
        } else {
            self.users.find_by_nickname(login).await?
        };
        found.ok_or_else(|| {
            warn!(login, "no user for login");
            missing
        })
    }

    async fn ensure_available(&self, email: &str, nickname: &str) -> Outcome<()> {
        let email_taken = self.users.find_by_email(email).await?.is_some();
        let nickname_taken = self.users.find_by_nickname(nickname).await?.is_some();
        if email_taken || nickname_taken {
            warn!(email, nickname, "email or nickname already registered");
            return Err(Error::USER_ALREADY_EXISTS);
        }
        Ok(())
    }
}

fn check_password(user: User, password: &str) -> Outcome<User> {
    verify_password(password, &user.password_hash).bind(|ok| {
        if ok {
            Ok(user)
        } else {
            warn!(user_id = user.id, "login with invalid password");
            Err(Error::WRONG_PASSWORD)
        }
    })
}

fn validate_password(password: &str) -> Outcome<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(json!({
            "password": format!("must be at least {MIN_PASSWORD_LEN} characters")
        })));
    }
    Ok(())
}

/// Normalizes the request and reports every invalid field at once.
fn validate_registration(mut request: RegisterRequest) -> Outcome<RegisterRequest> {
    request.email = request.email.trim().to_lowercase();
    request.nickname = request.nickname.trim().to_owned();

    let mut fields = Map::new();
    if !is_valid_email(&request.email) {
        fields.insert("email".into(), Value::from("invalid email address"));
    }
    let nickname_len = request.nickname.chars().count();
    if nickname_len == 0 || nickname_len > MAX_NICKNAME_LEN {
        fields.insert(
            "nickname".into(),
            Value::from(format!("must be 1 to {MAX_NICKNAME_LEN} characters")),
        );
    } else if request.nickname.contains('@') {
        fields.insert("nickname".into(), Value::from("must not contain '@'"));
    }
    if let Err(err) = validate_password(&request.password) {
        if let Description::Details(Value::Object(details)) = err.description() {
            fields.extend(details.clone());
        }
    }

    if fields.is_empty() {
        Ok(request)
    } else {
        Err(Error::validation(Value::Object(fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::claims::TokenKind,
        error::ErrorKind,
        test_support::{harness, harness_with, StaticSecrets, PASSWORD},
    };

    fn register_request(email: &str, nickname: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            nickname: nickname.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada.example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("a da@example.com"));
    }

    #[tokio::test]
    async fn register_creates_user_and_session() {
        let h = harness();
        let session = h
            .state
            .auth
            .register(register_request(" Ada@Example.com ", "ada", PASSWORD))
            .await
            .expect("register");

        assert_eq!(session.user.email, "ada@example.com");
        let stored = h.users.get(session.user.id);
        assert_eq!(stored.refresh_token, session.refresh_token.as_str());
        assert!(verify_password(PASSWORD, &stored.password_hash).expect("verify"));
    }

    #[tokio::test]
    async fn register_without_signing_key_creates_no_account() {
        let h = harness_with(StaticSecrets::all().without(TokenKind::Refresh));
        let request = || register_request("ada@example.com", "ada", PASSWORD);

        assert_eq!(
            h.state.auth.register(request()).await.unwrap_err(),
            Error::CONFIGURATION_ERROR
        );
        assert!(h.users.find_by_email("ada@example.com").await.expect("lookup").is_none());
        assert_eq!(
            h.state.auth.register(request()).await.unwrap_err(),
            Error::CONFIGURATION_ERROR
        );
    }

    #[tokio::test]
    async fn register_rejects_taken_email_or_nickname() {
        let h = harness();
        h.users.insert("ada@example.com", "ada");

        let by_email = h
            .state
            .auth
            .register(register_request("ada@example.com", "other", PASSWORD))
            .await
            .unwrap_err();
        assert_eq!(by_email, Error::USER_ALREADY_EXISTS);

        let by_nickname = h
            .state
            .auth
            .register(register_request("other@example.com", "ada", PASSWORD))
            .await
            .unwrap_err();
        assert_eq!(by_nickname, Error::USER_ALREADY_EXISTS);
    }

    #[tokio::test]
    async fn register_reports_every_invalid_field() {
        let h = harness();
        let err = h
            .state
            .auth
            .register(register_request("nope", "a@b", "short"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let Description::Details(Value::Object(fields)) = err.description() else {
            panic!("structured details expected");
        };
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("nickname"));
        assert!(fields.contains_key("password"));
    }

    #[tokio::test]
    async fn login_by_email_or_nickname() {
        let h = harness();
        let user = h.users.insert("ada@example.com", "ada");

        let by_email = h
            .state
            .auth
            .login("ADA@example.com", PASSWORD)
            .await
            .expect("login by email");
        assert_eq!(by_email.user.id, user.id);

        let by_nickname = h.state.auth.login("ada", PASSWORD).await.expect("login by nickname");
        assert_eq!(by_nickname.user.id, user.id);
        assert_eq!(
            h.users.get(user.id).refresh_token,
            by_nickname.refresh_token.as_str()
        );
    }

    #[tokio::test]
    async fn login_failures() {
        let h = harness();
        h.users.insert("ada@example.com", "ada");

        assert_eq!(
            h.state.auth.login("grace", PASSWORD).await.unwrap_err(),
            Error::WRONG_LOGIN
        );
        assert_eq!(
            h.state.auth.login("ada", "wrong-password").await.unwrap_err(),
            Error::WRONG_PASSWORD
        );
    }

    #[tokio::test]
    async fn refresh_rotates_the_stored_token() {
        let h = harness();
        h.users.insert("ada@example.com", "ada");
        let first = h.state.auth.login("ada", PASSWORD).await.expect("login");

        let second = h
            .state
            .auth
            .refresh(first.refresh_token.as_str())
            .await
            .expect("refresh");
        assert_ne!(first.refresh_token, second.refresh_token);

        assert_eq!(
            h.state
                .auth
                .refresh(first.refresh_token.as_str())
                .await
                .unwrap_err(),
            Error::INVALID_TOKEN
        );
    }

    #[tokio::test]
    async fn password_reset_for_unknown_login_is_wrong_email() {
        let h = harness();
        assert_eq!(
            h.state
                .auth
                .request_password_reset("nobody@example.com")
                .await
                .unwrap_err(),
            Error::WRONG_EMAIL
        );
        assert!(h.mailer.last().is_none());
    }

    #[tokio::test]
    async fn completed_reset_changes_password_and_ends_sessions() {
        let h = harness();
        let user = h.users.insert("ada@example.com", "ada");
        let session = h.state.auth.login("ada", PASSWORD).await.expect("login");
        h.state
            .auth
            .request_password_reset("ada")
            .await
            .expect("request reset");
        let token = h.users.get(user.id).password_reset_token;

        h.state
            .auth
            .complete_reset(&token, "a-brand-new-password")
            .await
            .expect("complete reset");

        assert_eq!(
            h.state
                .auth
                .refresh(session.refresh_token.as_str())
                .await
                .unwrap_err(),
            Error::INVALID_TOKEN
        );
        assert_eq!(
            h.state.auth.login("ada", PASSWORD).await.unwrap_err(),
            Error::WRONG_PASSWORD
        );
        assert!(h.state.auth.login("ada", "a-brand-new-password").await.is_ok());
        assert_eq!(
            h.state
                .auth
                .complete_reset(&token, "yet-another-password")
                .await
                .unwrap_err(),
            Error::INVALID_TOKEN
        );
    }

    #[tokio::test]
    async fn sessions_issued_in_the_same_second_are_distinct() {
        let h = harness();
        let user = h.users.insert("ada@example.com", "ada");
        let first = h.state.auth.login("ada", PASSWORD).await.expect("first login");
        let second = h.state.auth.login("ada", PASSWORD).await.expect("second login");

        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(
            h.users.get(user.id).refresh_token,
            second.refresh_token.as_str()
        );
        assert_eq!(
            h.state
                .auth
                .refresh(first.refresh_token.as_str())
                .await
                .unwrap_err(),
            Error::INVALID_TOKEN
        );
    }

    #[tokio::test]
    async fn failed_password_write_keeps_the_reset_link() {
        let h = harness();
        let user = h.users.insert("ada@example.com", "ada");
        h.state
            .auth
            .request_password_reset("ada")
            .await
            .expect("request reset");
        let token = h.users.get(user.id).password_reset_token;

        h.users.fail_saves(true);
        assert_eq!(
            h.state
                .auth
                .complete_reset(&token, "a-brand-new-password")
                .await
                .unwrap_err(),
            Error::DATABASE
        );
        h.users.fail_saves(false);

        let stored = h.users.get(user.id);
        assert_eq!(stored.password_reset_token, token);
        assert!(verify_password(PASSWORD, &stored.password_hash).expect("verify"));
        assert!(h
            .state
            .auth
            .complete_reset(&token, "a-brand-new-password")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn completed_reset_is_a_single_write() {
        let h = harness();
        let user = h.users.insert("ada@example.com", "ada");
        h.state
            .auth
            .request_password_reset("ada")
            .await
            .expect("request reset");
        let token = h.users.get(user.id).password_reset_token;
        let before = h.users.save_count();

        h.state
            .auth
            .complete_reset(&token, "a-brand-new-password")
            .await
            .expect("complete reset");
        assert_eq!(h.users.save_count(), before + 1);
        assert!(h.users.get(user.id).password_reset_token.is_empty());
    }

    #[tokio::test]
    async fn short_new_password_keeps_the_token() {
        let h = harness();
        let user = h.users.insert("ada@example.com", "ada");
        h.state
            .auth
            .request_password_reset("ada@example.com")
            .await
            .expect("request reset");
        let token = h.users.get(user.id).password_reset_token;

        let err = h.state.auth.complete_reset(&token, "short").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(h.users.get(user.id).password_reset_token, token);
    }

    #[tokio::test]
    async fn me_returns_public_profile() {
        let h = harness();
        let user = h.users.insert("ada@example.com", "ada");
        let me = h.state.auth.me(user.id).await.expect("me");
        assert_eq!(me.nickname, "ada");
        assert_eq!(h.state.auth.me(999).await.unwrap_err(), Error::WRONG_USER_ID);
    }
}
