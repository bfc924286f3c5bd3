use anyhow::{bail, Context};
use time::Duration;

const MAX_LIFETIME_MINUTES: i64 = 10 * 365 * 24 * 60;
const MAX_LIFETIME_DAYS: i64 = 10 * 365;

/// Issuer, audience and lifetime of one token kind. The secret is resolved
/// separately and never stored here.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    pub audience: String,
    pub lifetime: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub client_url: String,
    pub access: TokenSettings,
    pub refresh: TokenSettings,
    pub password_reset: TokenSettings,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let client_url = env_or("CLIENT_URL", "http://localhost:3000");
        let access = TokenSettings {
            issuer: env_or("ACCESS_TOKEN_ISSUER", "tracklist"),
            audience: env_or("ACCESS_TOKEN_AUDIENCE", "tracklist-users"),
            lifetime: Duration::minutes(env_lifetime(
                "ACCESS_TOKEN_LIFETIME_MINUTES",
                15,
                MAX_LIFETIME_MINUTES,
            )?),
        };
        let refresh = TokenSettings {
            issuer: env_or("REFRESH_TOKEN_ISSUER", "tracklist"),
            audience: env_or("REFRESH_TOKEN_AUDIENCE", "tracklist-sessions"),
            lifetime: Duration::days(env_lifetime(
                "REFRESH_TOKEN_LIFETIME_DAYS",
                7,
                MAX_LIFETIME_DAYS,
            )?),
        };
        let password_reset = TokenSettings {
            issuer: env_or("PASSWORD_RESET_ISSUER", "tracklist"),
            audience: env_or("PASSWORD_RESET_AUDIENCE", "tracklist-password-reset"),
            lifetime: Duration::minutes(env_lifetime(
                "PASSWORD_RESET_LIFETIME_MINUTES",
                30,
                MAX_LIFETIME_MINUTES,
            )?),
        };
        Ok(Self {
            database_url,
            client_url: client_url.trim_end_matches('/').to_owned(),
            access,
            refresh,
            password_reset,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn env_lifetime(name: &str, default: i64, max: i64) -> anyhow::Result<i64> {
    parse_lifetime(name, std::env::var(name).ok().as_deref(), default, max)
}

/// An unset variable takes the default; anything set must be a whole number
/// in `1..=max`.
fn parse_lifetime(name: &str, raw: Option<&str>, default: i64, max: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("{name} must be a whole number, got {raw:?}"))?;
    if value <= 0 || value > max {
        bail!("{name} must be between 1 and {max}, got {value}");
    }
    Ok(value)
}
