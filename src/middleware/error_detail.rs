use crate::error::DetailedErrorBody;
use axum::{
    Json,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Swap 500 bodies for their detailed form. Mounted only when
/// `basic.expose_error_detail` is on.
pub async fn expose_error_detail(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let Some(DetailedErrorBody(body)) = resp.extensions_mut().remove::<DetailedErrorBody>()
    else {
        return resp;
    };
    (resp.status(), Json(body)).into_response()
}
