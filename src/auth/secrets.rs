use std::fmt;

use tracing::error;

use super::claims::TokenKind;
use crate::{error::Error, outcome::Outcome};

/// Symmetric signing key. Never printed.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Resolves the signing secret for a token kind.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, kind: TokenKind) -> Outcome<Secret>;
}

/// Reads secrets from the process environment on every call. A missing or
/// blank variable is a configuration error; there is no fallback key.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretResolver;

impl SecretResolver for EnvSecretResolver {
    fn resolve(&self, kind: TokenKind) -> Outcome<Secret> {
        let var = kind.secret_var();
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(Secret::new(value)),
            _ => {
                error!(variable = var, kind = ?kind, "signing secret is not configured");
                Err(Error::CONFIGURATION_ERROR)
            }
        }
    }
}
