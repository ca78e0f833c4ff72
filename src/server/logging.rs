//! Request logging middleware.
//!
//! Every request gets a UUID request ID, a tracing span carrying method and
//! path, a completion log line with status and duration, and an
//! `X-Request-Id` response header.
//!
//! # Usage
//!
//! ```rust,ignore
//! use axum::middleware;
//! use eyeshield::server::logging::request_logging_middleware;
//!
//! let app = Router::new()
//!     .route("/health", get(health_handler))
//!     .layer(middleware::from_fn(request_logging_middleware));
//! ```

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Response},
    middleware::Next,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Header name for the request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Generate a new unique request ID.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Logging middleware that tracks request timing and generates request IDs.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response<Body> {
    let request_id = generate_request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    let start = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;

    let duration = start.elapsed();
    let status = response.status();

    let _enter = span.enter();
    info!(
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    let (mut parts, body) = response.into_parts();
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, header_value);
    }

    Response::from_parts(parts, body)
}

/// Health check response structure.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Number of unexpired licenses
    pub licenses: usize,
}

impl HealthResponse {
    pub fn healthy(licenses: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            service: "eyeshield".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            licenses,
        }
    }
}
