use crate::{
    auth::{
        access::AccessTokenService,
        jwt::ValidationParameters,
        password_reset::PasswordResetService,
        refresh::RefreshTokenService,
        repo::{PgUserStore, UserStore},
        secrets::{EnvSecretResolver, SecretResolver},
        services::AuthService,
    },
    clock::{Clock, SystemClock},
    config::AppConfig,
    email::{EmailSender, LogMailer},
    outcome::Outcome,
    playlists::{
        repo::{PgPlaylistStore, PlaylistStore},
        services::PlaylistService,
    },
};
use anyhow::Context;
use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub access: AccessTokenService,
    /// Resolved once at startup; every bearer token is checked against it.
    pub bearer: Arc<ValidationParameters>,
    pub auth: AuthService,
    pub playlists: PlaylistService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        run_migrations(&db).await?;

        let state = Self::from_parts(
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgPlaylistStore::new(db)),
            Arc::new(LogMailer),
            Arc::new(EnvSecretResolver),
            Arc::new(SystemClock),
        )?;
        info!("application state ready");
        Ok(state)
    }

    /// Wires the services over the given collaborators. Fails when the access
    /// token secret cannot be resolved.
    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        playlists: Arc<dyn PlaylistStore>,
        mailer: Arc<dyn EmailSender>,
        secrets: Arc<dyn SecretResolver>,
        clock: Arc<dyn Clock>,
    ) -> Outcome<Self> {
        let access = AccessTokenService::new(config.access.clone(), secrets.clone(), clock.clone());
        let bearer = Arc::new(access.validation_parameters()?);

        let refresh = RefreshTokenService::new(
            config.refresh.clone(),
            secrets.clone(),
            clock.clone(),
            users.clone(),
        );
        let reset = PasswordResetService::new(
            config.password_reset.clone(),
            secrets,
            clock,
            users.clone(),
            mailer,
            config.client_url.clone(),
        );

        Ok(Self {
            config,
            auth: AuthService::new(users.clone(), access.clone(), refresh, reset),
            access,
            bearer,
            playlists: PlaylistService::new(playlists, users),
        })
    }
}

/// Brings the schema up to date. Any failure stops startup.
pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run database migrations")?;
    info!("database migrations applied");
    Ok(())
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for PlaylistService {
    fn from_ref(state: &AppState) -> Self {
        state.playlists.clone()
    }
}
