use crate::error::SiteError;
use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;

/// Request body accepted either as JSON or as an urlencoded form post.
/// Rejections become `SiteError::InvalidBody` so clients always get the API error shape.
pub struct ApiPayload<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        == Some(true)
}

impl<T, S> FromRequest<S> for ApiPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SiteError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(body) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| SiteError::InvalidBody(rejection.body_text()))?;
            return Ok(Self(body));
        }
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| SiteError::InvalidBody(rejection.body_text()))?;
        Ok(Self(body))
    }
}
