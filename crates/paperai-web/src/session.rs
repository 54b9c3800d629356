//! Session store: where the bearer token lives between requests.
//!
//! Views receive a [`SessionStore`] instead of reaching for the cookie jar
//! themselves. The production store is [`CookieSession`]: a permanent,
//! HttpOnly cookie scoped to this origin, which survives reloads and
//! browser restarts. There is no expiry or refresh; a stale token surfaces
//! as an ordinary backend failure.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use paperai_common::AuthToken;
use paperai_config::SessionConfig;

pub trait SessionStore {
    fn token(&self) -> Option<AuthToken>;
    fn set_token(&mut self, token: &AuthToken);
    fn clear_token(&mut self);

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Cookie-backed store. Hand the jar back with the response via
/// [`CookieSession::into_jar`] so writes reach the browser.
pub struct CookieSession {
    jar: CookieJar,
    cookie_name: String,
    secure: bool,
}

impl CookieSession {
    pub fn new(jar: CookieJar, config: &SessionConfig) -> Self {
        Self {
            jar,
            cookie_name: config.cookie_name.clone(),
            secure: config.secure_cookies,
        }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl SessionStore for CookieSession {
    fn token(&self) -> Option<AuthToken> {
        self.jar
            .get(&self.cookie_name)
            .map(|c| AuthToken::new(c.value()))
            .filter(|t| !t.is_blank())
    }

    fn set_token(&mut self, token: &AuthToken) {
        let cookie = Cookie::build((self.cookie_name.clone(), token.expose().to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .permanent()
            .build();
        self.jar = self.jar.clone().add(cookie);
    }

    fn clear_token(&mut self) {
        self.jar = self.jar.clone().remove(Cookie::build((self.cookie_name.clone(), "")).path("/"));
    }
}

/// Process-local store for tests and tooling.
#[derive(Debug, Default)]
pub struct MemorySession {
    token: Option<String>,
}

impl MemorySession {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()) }
    }

    pub fn raw_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl SessionStore for MemorySession {
    fn token(&self) -> Option<AuthToken> {
        self.token.as_deref().map(AuthToken::new).filter(|t| !t.is_blank())
    }

    fn set_token(&mut self, token: &AuthToken) {
        self.token = Some(token.expose().to_string());
    }

    fn clear_token(&mut self) {
        self.token = None;
    }
}
