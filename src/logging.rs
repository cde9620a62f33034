//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// The number of body bytes to log at the `info` level before truncating.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level. Multipart request
/// bodies (file uploads) are logged as a byte count only.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("multipart/form-data"));

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    if is_multipart {
        tracing::info!(
            "Received request: {parts:#?}\nbody: <{} bytes of multipart form data>",
            body_bytes.len()
        );
    } else {
        log_body("Received request", &format!("{parts:#?}"), &body_bytes);
    }

    let request = Request::from_parts(parts, body_bytes.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    log_body("Sending response", &format!("{parts:#?}"), &body_bytes);

    Response::from_parts(parts, body_bytes.into())
}

fn log_body(prefix: &str, parts: &str, body_bytes: &[u8]) {
    let body = String::from_utf8_lossy(body_bytes);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{prefix}: {parts}\nbody: {:}...",
            body.get(..LOG_BODY_LENGTH_LIMIT).unwrap_or(&body)
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{prefix}: {parts}\nbody: {body:?}");
    }
}
