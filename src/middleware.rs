use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// One log line per request; server errors are logged as warnings.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let length = response
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    if status.is_server_error() {
        warn!(
            method = %method,
            url = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP request failed"
        );
    } else {
        info!(
            method = %method,
            url = %uri,
            status = status.as_u16(),
            length,
            elapsed_ms,
            "HTTP request"
        );
    }

    response
}
