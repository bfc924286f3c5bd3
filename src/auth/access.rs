use std::sync::Arc;

use tracing::{debug, instrument};

use super::{
    claims::{claim_types, Claim, SignedToken, TokenKind},
    jwt::{TokenCodec, ValidationParameters},
    repo_types::{User, UserId},
    secrets::SecretResolver,
};
use crate::{clock::Clock, config::TokenSettings, error::Error, outcome::Outcome};

/// Issues short-lived bearer tokens and checks them on every request.
#[derive(Clone)]
pub struct AccessTokenService {
    codec: TokenCodec,
    settings: TokenSettings,
    secrets: Arc<dyn SecretResolver>,
    clock: Arc<dyn Clock>,
}

impl AccessTokenService {
    pub fn new(
        settings: TokenSettings,
        secrets: Arc<dyn SecretResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec: TokenCodec::new(clock.clone()),
            settings,
            secrets,
            clock,
        }
    }

    fn claims(user: &User) -> Vec<Claim> {
        vec![
            Claim::new(claim_types::NAME, user.nickname.as_str()),
            Claim::new(claim_types::SUBJECT_ID, user.id.to_string()),
        ]
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub fn generate(&self, user: &User) -> Outcome<SignedToken> {
        let secret = self.secrets.resolve(TokenKind::Access)?;
        let expires_at = self.clock.now() + self.settings.lifetime;
        self.codec.encode(
            &Self::claims(user),
            &self.settings.issuer,
            &self.settings.audience,
            &secret,
            expires_at,
        )
    }

    /// Fails with a configuration error when no signing secret is set.
    pub fn ensure_configured(&self) -> Outcome<()> {
        self.secrets.resolve(TokenKind::Access).map(|_| ())
    }

    /// Parameters the bearer extractor validates against. Resolved once while
    /// building the application state; without a secret the service does not
    /// start.
    pub fn validation_parameters(&self) -> Outcome<ValidationParameters> {
        Ok(ValidationParameters {
            issuer: self.settings.issuer.clone(),
            audience: self.settings.audience.clone(),
            secret: self.secrets.resolve(TokenKind::Access)?,
        })
    }

    pub fn authenticate(&self, token: &str, params: &ValidationParameters) -> Outcome<UserId> {
        let claims = self.codec.decode(token, params)?;
        let user_id = claims
            .get(claim_types::SUBJECT_ID)
            .and_then(|id| id.parse::<UserId>().ok())
            .ok_or(Error::INVALID_TOKEN)?;
        debug!(user_id, "bearer token accepted");
        Ok(user_id)
    }
}
