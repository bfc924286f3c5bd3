use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The three token families, each with its own secret and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    PasswordReset,
}

impl TokenKind {
    /// Environment variable holding the signing secret.
    pub const fn secret_var(self) -> &'static str {
        match self {
            TokenKind::Access => "ACCESS_TOKEN_SECRET",
            TokenKind::Refresh => "REFRESH_TOKEN_SECRET",
            TokenKind::PasswordReset => "PASSWORD_RESET_SECRET",
        }
    }
}

/// Claim types carried in token payloads.
pub mod claim_types {
    pub const NAME: &str = "name";
    pub const SUBJECT_ID: &str = "sub";
    pub const EMAIL: &str = "email";
    pub const JTI: &str = "jti";
}

/// A typed key/value fact embedded in a token payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Claim {
    pub kind: String,
    pub value: String,
}

impl Claim {
    pub fn new(kind: &str, value: impl Into<String>) -> Self {
        Self {
            kind: kind.to_owned(),
            value: value.into(),
        }
    }
}

/// Verified content of a decoded token. Claims are ordered by type.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub issuer: String,
    pub audience: String,
    pub expires_at: OffsetDateTime,
    pub claims: Vec<Claim>,
}

impl TokenClaims {
    pub fn get(&self, kind: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.value.as_str())
    }
}

/// Compact `header.payload.signature` token handed to clients.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedToken(..)")
    }
}

impl AsRef<str> for SignedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
