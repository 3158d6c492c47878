//! Request timing middleware.
//!
//! Every response carries `X-Response-Time` in milliseconds; requests slower
//! than [`SLOW_REQUEST_MS`] are logged at warn level.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

pub const RESPONSE_TIME_HEADER: &str = "x-response-time";
pub const SLOW_REQUEST_MS: u128 = 1_000;

pub async fn response_time(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let elapsed_ms = started_at.elapsed().as_millis();
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed_ms}ms")) {
        response.headers_mut().insert(RESPONSE_TIME_HEADER, value);
    }

    let status = response.status().as_u16();
    if elapsed_ms > SLOW_REQUEST_MS {
        warn!(
            "event=http_request module=http status=slow method={} path={} http_status={} duration_ms={}",
            method, path, status, elapsed_ms
        );
    } else {
        info!(
            "event=http_request module=http status=ok method={} path={} http_status={} duration_ms={}",
            method, path, status, elapsed_ms
        );
    }
    response
}
