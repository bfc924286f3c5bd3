use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;

pub const REFRESH_COOKIE: &str = "refresh_token";

/// Attributes of the cookie carrying the refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSpec {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub expires_at: OffsetDateTime,
}

impl CookieSpec {
    /// HTTP-only, secure, sent cross-site (the client lives on another origin).
    pub fn refresh(expires_at: OffsetDateTime) -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::None,
            expires_at,
        }
    }

    pub fn into_cookie(self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .expires(self.expires_at)
            .build()
    }
}
