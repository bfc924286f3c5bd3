use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    claims::{claim_types, Claim, SignedToken, TokenKind},
    jwt::{TokenCodec, ValidationParameters},
    repo::UserStore,
    repo_types::User,
    secrets::SecretResolver,
};
use crate::{
    clock::Clock, config::TokenSettings, email::EmailSender, error::Error, outcome::Outcome,
};

const EMAIL_SUBJECT: &str = "Password reset";

/// Single-use password reset tokens delivered by e-mail.
#[derive(Clone)]
pub struct PasswordResetService {
    codec: TokenCodec,
    settings: TokenSettings,
    secrets: Arc<dyn SecretResolver>,
    clock: Arc<dyn Clock>,
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn EmailSender>,
    client_url: String,
}

impl PasswordResetService {
    pub fn new(
        settings: TokenSettings,
        secrets: Arc<dyn SecretResolver>,
        clock: Arc<dyn Clock>,
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn EmailSender>,
        client_url: String,
    ) -> Self {
        Self {
            codec: TokenCodec::new(clock.clone()),
            settings,
            secrets,
            clock,
            users,
            mailer,
            client_url,
        }
    }

    /// The `jti` nonce keeps two tokens for the same address distinct.
    pub fn generate(&self, email: &str) -> Outcome<SignedToken> {
        let secret = self.secrets.resolve(TokenKind::PasswordReset)?;
        self.codec.encode(
            &[
                Claim::new(claim_types::EMAIL, email),
                Claim::new(claim_types::JTI, Uuid::new_v4().to_string()),
            ],
            &self.settings.issuer,
            &self.settings.audience,
            &secret,
            self.clock.now() + self.settings.lifetime,
        )
    }

    pub async fn persist(&self, mut user: User, token: &SignedToken) -> Outcome<User> {
        user.password_reset_token = token.as_str().to_owned();
        self.users.save(&user).await?;
        Ok(user)
    }

    pub fn reset_link(&self, token: &SignedToken) -> String {
        format!("{}/password-reset/complete/{}", self.client_url, token.as_str())
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn generate_and_send(&self, user: User) -> Outcome<()> {
        let token = self.generate(&user.email)?;
        let user = self.persist(user, &token).await?;
        let body = reset_email_body(&self.reset_link(&token));
        self.mailer.send(&user.email, EMAIL_SUBJECT, &body).await?;
        info!(user_id = user.id, "password reset link sent");
        Ok(())
    }

    /// Verifies the token and matches it against the one stored for the
    /// subject. Nothing is written; the caller clears the slot together with
    /// whatever change the token authorizes.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Outcome<User> {
        let params = ValidationParameters {
            issuer: self.settings.issuer.clone(),
            audience: self.settings.audience.clone(),
            secret: self.secrets.resolve(TokenKind::PasswordReset)?,
        };
        let claims = self.codec.decode(token, &params)?;
        let email = claims
            .get(claim_types::EMAIL)
            .ok_or(Error::INVALID_TOKEN)?;

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(Error::INVALID_TOKEN)?;

        if user.password_reset_token.is_empty() || user.password_reset_token != token {
            warn!(user_id = user.id, "password reset token does not match the stored one");
            return Err(Error::INVALID_TOKEN);
        }
        Ok(user)
    }

    /// Like [`validate`](Self::validate), then clears the stored token so it
    /// can be redeemed once.
    pub async fn validate_and_consume(&self, token: &str) -> Outcome<User> {
        let mut user = self.validate(token).await?;
        user.password_reset_token.clear();
        self.users.save(&user).await?;
        Ok(user)
    }
}

fn reset_email_body(link: &str) -> String {
    format!(
        r#"<html>
    <body style="width: 100%;">
        <h3 style="text-align: center;">To reset your password</h3>
        <div style="text-align: center; margin-top: 10px;">
            <a href="{link}" style="background-color: #4CAF50; color: white; padding: 14px 20px; text-decoration: none; display: inline-block; border-radius: 4px;">Click here</a>
        </div>
    </body>
</html>"#
    )
}
