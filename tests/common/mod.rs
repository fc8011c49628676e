#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use portfolio_site::config::Config;
use portfolio_site::db::SiteStorage;
use portfolio_site::router::{SiteState, site_router};
use portfolio_site::service::store_actor::{self, StoreHandle};
use serde_json::Value;
use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

pub struct TestApp {
    pub app: Router,
    pub store: StoreHandle,
    pub storage: SiteStorage,
    pub cfg: Config,
    temp_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.store.stop();
        let _ = std::fs::remove_file(&self.temp_path);
    }
}

fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "portfolio-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    temp_path
}

pub async fn spawn_app(tag: &str) -> TestApp {
    spawn_app_with(tag, Config::default()).await
}

pub async fn spawn_app_with(tag: &str, mut cfg: Config) -> TestApp {
    let temp_path = temp_db_path(tag);
    cfg.basic.database_url = format!("sqlite:{}", temp_path.display());
    cfg.basic.session_secret = "s".repeat(64);

    let storage = SiteStorage::connect(&cfg.basic.database_url)
        .await
        .expect("failed to open test database");
    let store = store_actor::spawn(
        storage.clone(),
        cfg.session.ttl(),
        cfg.session.purge_interval(),
    )
    .await
    .expect("failed to spawn store actor");
    let state = SiteState::new(store.clone(), &cfg).expect("invalid test config");

    TestApp {
        app: site_router(state),
        store,
        storage,
        cfg,
        temp_path,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.expect("request failed")
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(
            builder
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
        )
        .await
    }

    pub async fn post_empty(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("failed to build request"))
            .await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("failed to build request"))
            .await
    }
}

/// `name=value` of the session cookie set by `resp`, ready for a `Cookie` header.
pub fn session_cookie(resp: &Response<Body>, name: &str) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

pub fn set_cookie_headers(resp: &Response<Body>) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

pub async fn json_body(resp: Response<Body>) -> (StatusCode, Value) {
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = serde_json::from_slice(&body).expect("response body was not JSON");
    (status, value)
}
