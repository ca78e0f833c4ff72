use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::handlers::{
    generate_license_handler, get_main_info_handler, health_handler, AppState,
};
use crate::server::logging::request_logging_middleware;

/// Build the application router.
///
/// # Routes
///
/// - `GET /GetMainInfo?keyused=<key>` - Check a license key
/// - `POST /GenerateLicense` - Issue a license for `{"duration": "..."}`
/// - `GET /health` - Liveness check
///
/// Every route is wrapped in the request logging middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/GetMainInfo", get(get_main_info_handler))
        .route("/GenerateLicense", post(generate_license_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}
