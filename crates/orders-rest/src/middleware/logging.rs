//! Request logging middleware.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Logs method, path, status and latency for each request. Server errors are
/// logged at `warn`.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    macro_rules! log_request {
        ($level:ident, $message:literal) => {
            tracing::$level!(
                target: "http",
                method = %method,
                uri = %uri,
                status = status.as_u16(),
                duration_ms,
                $message
            )
        };
    }

    if status.is_server_error() {
        log_request!(warn, "HTTP request failed");
    } else {
        log_request!(info, "HTTP request completed");
    }

    response
}
