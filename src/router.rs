use crate::config::{Config, SessionConfig};
use crate::handlers::auth::{login, logout, session_status, signup};
use crate::middleware::error_detail::expose_error_detail;
use crate::middleware::session::cookie_key;
use crate::middleware::throttle::{GlobalLimiter, build_limiter, throttle};
use crate::error::SiteError;
use crate::service::password::decoy_hash;
use crate::service::store_actor::StoreHandle;
use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

#[derive(Clone)]
pub struct SiteState {
    pub store: StoreHandle,
    pub session: Arc<SessionConfig>,
    pub limiter: Option<Arc<GlobalLimiter>>,
    pub expose_error_detail: bool,
    /// Verified against when a login names an unknown email.
    pub(crate) login_decoy: Arc<str>,
    cookie_key: Key,
}

impl SiteState {
    pub fn new(store: StoreHandle, cfg: &Config) -> Result<Self, SiteError> {
        cfg.session.validate().map_err(SiteError::Config)?;
        let cookie_key = cookie_key(&cfg.basic.session_secret).map_err(SiteError::Config)?;
        Ok(Self {
            store,
            session: Arc::new(cfg.session.clone()),
            limiter: build_limiter(&cfg.throttle),
            expose_error_detail: cfg.basic.expose_error_detail,
            login_decoy: decoy_hash()?.into(),
            cookie_key,
        })
    }
}

impl FromRef<SiteState> for Key {
    fn from_ref(state: &SiteState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn site_router(state: SiteState) -> Router {
    let mut api = Router::new()
        .route("/api/session", get(session_status))
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout));

    if let Some(limiter) = state.limiter.clone() {
        api = api.layer(middleware::from_fn_with_state(limiter, throttle));
    }
    if state.expose_error_detail {
        api = api.layer(middleware::from_fn(expose_error_detail));
    }

    api.route("/health", get(|| async { "ok" }))
        .with_state(state)
}
