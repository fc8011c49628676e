use crate::types::auth::{LoginRequest, SessionStatus, SignupRequest};
use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::warn;
use url::Url;

#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Connection-level failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Reqwest(e) if e.is_connect() || e.is_timeout())
    }
}

/// Status plus decoded body of an API call. Error bodies decode too, since
/// the pages show the server's `message`.
#[derive(Debug, Clone)]
pub struct ApiReply<T> {
    pub status: StatusCode,
    pub body: T,
}

impl<T> ApiReply<T> {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

fn session_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(2)
}

/// Cookie-carrying client for the site API, like a browser tab.
#[derive(Clone)]
pub struct SiteClient {
    http: reqwest::Client,
    base: Url,
}

impl SiteClient {
    pub fn new(base: Url) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent("portfolio-site-client/0.1")
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { http, base })
    }

    /// GET /api/session, retrying connection failures.
    pub async fn session(&self) -> Result<SessionStatus, ClientError> {
        (|| async { self.fetch_session().await })
            .retry(session_retry_policy())
            .when(|e: &ClientError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!("session check retrying after error {}, sleeping {:?}", err, dur);
            })
            .await
    }

    async fn fetch_session(&self) -> Result<SessionStatus, ClientError> {
        let url = self.base.join("/api/session")?;
        let bytes = self.http.get(url).send().await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn signup<T: DeserializeOwned>(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<ApiReply<T>, ClientError> {
        let body = SignupRequest {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        self.post("/api/signup", Some(&body)).await
    }

    pub async fn login<T: DeserializeOwned>(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ApiReply<T>, ClientError> {
        let body = LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        self.post("/api/login", Some(&body)).await
    }

    pub async fn logout<T: DeserializeOwned>(&self) -> Result<ApiReply<T>, ClientError> {
        self.post::<(), T>("/api/logout", None).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiReply<T>, ClientError> {
        let url = self.base.join(path)?;
        let mut req = self.http.post(url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        Ok(ApiReply {
            status,
            body: serde_json::from_slice(&bytes)?,
        })
    }
}
