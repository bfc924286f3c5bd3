use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{
    claims::{claim_types, Claim, SignedToken, TokenKind},
    cookies::CookieSpec,
    jwt::{TokenCodec, ValidationParameters},
    repo::UserStore,
    repo_types::{User, UserId},
    secrets::SecretResolver,
};
use crate::{clock::Clock, config::TokenSettings, error::Error, outcome::Outcome};

/// Long-lived session tokens. The subject row keeps the one refresh token
/// that is currently valid; issuing a new one replaces it.
#[derive(Clone)]
pub struct RefreshTokenService {
    codec: TokenCodec,
    settings: TokenSettings,
    secrets: Arc<dyn SecretResolver>,
    clock: Arc<dyn Clock>,
    users: Arc<dyn UserStore>,
}

impl RefreshTokenService {
    pub fn new(
        settings: TokenSettings,
        secrets: Arc<dyn SecretResolver>,
        clock: Arc<dyn Clock>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            codec: TokenCodec::new(clock.clone()),
            settings,
            secrets,
            clock,
            users,
        }
    }

    /// Fails with a configuration error when no signing secret is set.
    pub fn ensure_configured(&self) -> Outcome<()> {
        self.secrets.resolve(TokenKind::Refresh).map(|_| ())
    }

    /// The `jti` nonce keeps tokens issued within the same second distinct.
    pub fn generate(&self, user: &User) -> Outcome<SignedToken> {
        let secret = self.secrets.resolve(TokenKind::Refresh)?;
        self.codec.encode(
            &[
                Claim::new(claim_types::SUBJECT_ID, user.id.to_string()),
                Claim::new(claim_types::JTI, Uuid::new_v4().to_string()),
            ],
            &self.settings.issuer,
            &self.settings.audience,
            &secret,
            self.clock.now() + self.settings.lifetime,
        )
    }

    /// Stores `token` as the subject's only valid refresh token.
    pub async fn save(&self, mut user: User, token: &SignedToken) -> Outcome<User> {
        user.refresh_token = token.as_str().to_owned();
        self.users.save(&user).await?;
        debug!(user_id = user.id, "refresh token rotated");
        Ok(user)
    }

    /// Generates a refresh token and persists it on the subject.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn issue(&self, user: User) -> Outcome<(User, SignedToken)> {
        let token = self.generate(&user)?;
        let user = self.save(user, &token).await?;
        Ok((user, token))
    }

    pub fn cookie_options(&self) -> CookieSpec {
        CookieSpec::refresh(self.clock.now() + self.settings.lifetime)
    }

    /// Checks the signature and expiry, then that the token is the one
    /// currently stored for its subject.
    #[instrument(skip_all)]
    pub async fn validate_token(&self, token: &str) -> Outcome<User> {
        let params = ValidationParameters {
            issuer: self.settings.issuer.clone(),
            audience: self.settings.audience.clone(),
            secret: self.secrets.resolve(TokenKind::Refresh)?,
        };
        let claims = self.codec.decode(token, &params)?;
        let user_id = claims
            .get(claim_types::SUBJECT_ID)
            .and_then(|id| id.parse::<UserId>().ok())
            .ok_or(Error::INVALID_TOKEN)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(Error::WRONG_USER_ID)?;

        if user.refresh_token.is_empty() || user.refresh_token != token {
            warn!(user_id, "refresh token does not match the stored one");
            return Err(Error::INVALID_TOKEN);
        }
        Ok(user)
    }
}
