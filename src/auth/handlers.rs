use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::instrument;

use crate::{
    auth::{
        cookies::REFRESH_COOKIE,
        dto::{
            AuthResponse, LoginRequest, PasswordResetCompleteRequest, PasswordResetRequest,
            RegisterRequest,
        },
        extractors::AuthUser,
        repo_types::PublicUser,
        services::{AuthService, Session},
    },
    error::{Error, ErrorKind},
    outcome::FutureOutcomeExt,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/password-reset", post(request_password_reset))
        .route("/auth/password-reset/complete", post(complete_password_reset))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Access token in the body, refresh token in an HTTP-only cookie.
fn session_response(jar: CookieJar, status: StatusCode, session: Session) -> Response {
    let cookie = session
        .cookie
        .into_cookie(REFRESH_COOKIE, session.refresh_token.into_string());
    let body = AuthResponse {
        access_token: session.access_token,
        user: PublicUser::from(&session.user),
    };
    (status, jar.add(cookie), Json(body)).into_response()
}

#[instrument(skip(auth, jar, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    auth.register(payload)
        .fold_async(
            |session| session_response(jar, StatusCode::CREATED, session),
            |err| err.into_response(),
        )
        .await
}

#[instrument(skip(auth, jar, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Response {
    auth.login(&payload.login, &payload.password)
        .fold_async(
            |session| session_response(jar, StatusCode::OK, session),
            |err| err.into_response(),
        )
        .await
}

#[instrument(skip(auth, jar))]
pub async fn refresh(State(auth): State<AuthService>, jar: CookieJar) -> Response {
    let Some(token) = jar.get(REFRESH_COOKIE).map(|c| c.value().to_owned()) else {
        return Error::new(ErrorKind::InvalidToken, "Missing refresh token").into_response();
    };
    auth.refresh(&token)
        .fold_async(
            |session| session_response(jar, StatusCode::OK, session),
            |err| err.into_response(),
        )
        .await
}

#[instrument(skip(auth, payload))]
pub async fn request_password_reset(
    State(auth): State<AuthService>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<StatusCode, Error> {
    auth.request_password_reset(&payload.login).await?;
    Ok(StatusCode::ACCEPTED)
}

#[instrument(skip(auth, payload))]
pub async fn complete_password_reset(
    State(auth): State<AuthService>,
    Json(payload): Json<PasswordResetCompleteRequest>,
) -> Result<StatusCode, Error> {
    auth.complete_reset(&payload.token, &payload.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(auth))]
pub async fn get_me(
    State(auth): State<AuthService>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, Error> {
    auth.me(user_id).await.map(Json)
}
