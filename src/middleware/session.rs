use crate::config::SessionConfig;
use crate::router::SiteState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar};
use std::convert::Infallible;
use time::Duration;

/// Build the cookie key from the configured master secret. An empty secret
/// yields a random key, so sessions will not survive a restart.
pub fn cookie_key(secret: &str) -> Result<Key, String> {
    if secret.is_empty() {
        tracing::warn!("session_secret not configured; using an ephemeral cookie key");
        return Ok(Key::generate());
    }
    Key::try_from(secret.as_bytes())
        .map_err(|e| format!("session_secret must be at least 64 bytes: {e}"))
}

/// The session id carried by the request's private cookie, if any.
/// The jar is kept so handlers can set or clear the cookie in their response.
pub struct SessionCookie {
    pub jar: PrivateCookieJar,
    pub id: Option<String>,
}

impl FromRequestParts<SiteState> for SessionCookie {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SiteState,
    ) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state).await?;
        let id = jar
            .get(&state.session.cookie_name)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty());
        Ok(Self { jar, id })
    }
}

impl SessionCookie {
    pub fn set(self, cfg: &SessionConfig, session_id: String) -> PrivateCookieJar {
        self.jar.add(build_cookie(cfg, session_id))
    }

    pub fn clear(self, cfg: &SessionConfig) -> PrivateCookieJar {
        self.jar.remove(clear_cookie(cfg))
    }
}

pub fn build_cookie(cfg: &SessionConfig, value: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(cfg.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(cfg.same_site.into())
        .max_age(Duration::hours(i64::from(cfg.ttl_hours.max(1))))
        .build()
}

pub fn clear_cookie(cfg: &SessionConfig) -> Cookie<'static> {
    Cookie::build(Cookie::new(cfg.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(cfg.same_site.into())
        .build()
}
