//! Signed token codec: HS256 JWTs with issuer, audience and expiry.

use std::{collections::BTreeMap, sync::Arc};

use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, error, warn};

use super::{
    claims::{Claim, SignedToken, TokenClaims},
    secrets::Secret,
};
use crate::{
    clock::Clock,
    error::{Error, ErrorKind},
    outcome::Outcome,
};

/// The single algorithm tokens are signed and accepted with.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// What a presented token must match to be trusted.
#[derive(Debug, Clone)]
pub struct ValidationParameters {
    pub issuer: String,
    pub audience: String,
    pub secret: Secret,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    iss: String,
    aud: String,
    exp: i64,
    #[serde(flatten)]
    claims: BTreeMap<String, String>,
}

#[derive(Clone)]
pub struct TokenCodec {
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn encode(
        &self,
        claims: &[Claim],
        issuer: &str,
        audience: &str,
        secret: &Secret,
        expires_at: OffsetDateTime,
    ) -> Outcome<SignedToken> {
        let payload = Payload {
            iss: issuer.to_owned(),
            aud: audience.to_owned(),
            exp: expires_at.unix_timestamp(),
            claims: claims
                .iter()
                .map(|c| (c.kind.clone(), c.value.clone()))
                .collect(),
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &payload,
            &EncodingKey::from_secret(secret.expose()),
        )
        .map_err(|e| Error::failure(ErrorKind::Internal, "encode token", e))?;
        debug!(issuer, audience, exp = payload.exp, "token signed");
        Ok(SignedToken::new(token))
    }

    /// Verifies signature, algorithm, issuer and audience, then expiry
    /// against the injected clock. A token is expired once `now >= exp`.
    pub fn decode(&self, token: &str, expected: &ValidationParameters) -> Outcome<TokenClaims> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[expected.issuer.as_str()]);
        validation.set_audience(&[expected.audience.as_str()]);

        let data = decode::<Payload>(
            token,
            &DecodingKey::from_secret(expected.secret.expose()),
            &validation,
        )
        .map_err(rejection)?;
        let payload = data.claims;

        let now = self.clock.now().unix_timestamp();
        if now >= payload.exp {
            debug!(exp = payload.exp, now, "token expired");
            return Err(Error::TOKEN_EXPIRED);
        }
        let expires_at = OffsetDateTime::from_unix_timestamp(payload.exp)
            .map_err(|e| Error::INVALID_TOKEN.with_cause(e))?;

        Ok(TokenClaims {
            issuer: payload.iss,
            audience: payload.aud,
            expires_at,
            claims: payload
                .claims
                .into_iter()
                .map(|(kind, value)| Claim { kind, value })
                .collect(),
        })
    }
}

fn rejection(err: jsonwebtoken::errors::Error) -> Error {
    match err.kind() {
        JwtErrorKind::ExpiredSignature => Error::TOKEN_EXPIRED,
        JwtErrorKind::InvalidToken
        | JwtErrorKind::InvalidSignature
        | JwtErrorKind::InvalidAlgorithm
        | JwtErrorKind::InvalidAlgorithmName
        | JwtErrorKind::InvalidIssuer
        | JwtErrorKind::InvalidAudience
        | JwtErrorKind::MissingRequiredClaim(_)
        | JwtErrorKind::Base64(_)
        | JwtErrorKind::Json(_)
        | JwtErrorKind::Utf8(_) => {
            warn!(reason = %err, "token rejected");
            Error::INVALID_TOKEN
        }
        _ => {
            error!(action = "validate token", error = %err, "unexpected token validation error");
            Error::INVALID_TOKEN.with_cause(err)
        }
    }
}
