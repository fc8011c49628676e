use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum SiteError {
    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Email or username already in use.")]
    Conflict,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Too many requests; slow down.")]
    RateLimited,

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A server-side failure with the message shown to clients.
    #[error("{message}: {source}")]
    Internal {
        message: &'static str,
        #[source]
        source: Box<SiteError>,
    },
}

impl SiteError {
    pub fn status(&self) -> StatusCode {
        match self {
            SiteError::MissingField(_) | SiteError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            SiteError::Conflict => StatusCode::CONFLICT,
            SiteError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            SiteError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SiteError::DatabaseError(_)
            | SiteError::PasswordHash(_)
            | SiteError::RactorError(_)
            | SiteError::Config(_)
            | SiteError::Join(_)
            | SiteError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attach a client-facing message to server-side failures. Client errors
    /// pass through unchanged.
    pub fn during(message: &'static str) -> impl FnOnce(SiteError) -> SiteError {
        move |err| {
            if err.status().is_server_error() {
                SiteError::Internal {
                    message,
                    source: Box::new(err),
                }
            } else {
                err
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            SiteError::MissingField(_) | SiteError::InvalidBody(_) => "BAD_REQUEST",
            SiteError::Conflict => "CONFLICT",
            SiteError::InvalidCredentials => "UNAUTHORIZED",
            SiteError::RateLimited => "RATE_LIMITED",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if !status.is_server_error() {
            let body = ApiErrorBody {
                code: self.code().to_string(),
                message: self.to_string(),
                detail: None,
            };
            return (status, Json(body)).into_response();
        }

        error!(error = %self, "request failed");
        let message = match &self {
            SiteError::Internal { message, .. } => (*message).to_string(),
            _ => "An internal server error occurred.".to_string(),
        };
        let detail = match &self {
            SiteError::Internal { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        let body = ApiErrorBody {
            code: self.code().to_string(),
            message,
            detail: None,
        };
        let detailed = DetailedErrorBody(ApiErrorBody {
            detail: Some(detail),
            ..body.clone()
        });
        let mut resp = (status, Json(body)).into_response();
        resp.extensions_mut().insert(detailed);
        resp
    }
}

/// The 500 body with `detail` filled in. Rides along in the response
/// extensions; only the `error_detail` middleware puts it on the wire.
#[derive(Debug, Clone)]
pub struct DetailedErrorBody(pub ApiErrorBody);

/// Standardized API error response body
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: SiteError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_field_is_bad_request_with_field_message() {
        let (status, body) = body_json(SiteError::MissingField("email")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "email is required.");
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn internal_errors_hide_detail_by_default() {
        let err = SiteError::during("Could not log out.")(SiteError::RactorError(
            "mailbox closed".into(),
        ));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Could not log out.");
        assert!(body.get("detail").is_none());
    }

    #[test]
    fn internal_errors_carry_detail_in_extensions() {
        let resp = SiteError::RactorError("mailbox closed".into()).into_response();
        let detailed = resp.extensions().get::<DetailedErrorBody>().unwrap();
        assert_eq!(detailed.0.code, "INTERNAL_ERROR");
        assert_eq!(
            detailed.0.detail.as_deref(),
            Some("Ractor error: mailbox closed")
        );

        let resp = SiteError::Conflict.into_response();
        assert!(resp.extensions().get::<DetailedErrorBody>().is_none());
    }

    #[test]
    fn during_leaves_client_errors_alone() {
        let err = SiteError::during("An error occurred during login.")(
            SiteError::InvalidCredentials,
        );
        assert!(matches!(err, SiteError::InvalidCredentials));
    }
}
