// src/server/mod.rs

//! Server-side components for Eyeshield.
//!
//! This module contains:
//! - `api_error` → JSON error envelope and status mapping
//! - `handlers`  → axum HTTP handlers and `AppState`
//! - `logging`   → request logging middleware and license event logging
//! - `routes`    → router builder

pub mod api_error;
pub mod handlers;
pub mod logging;
pub mod routes;

pub use api_error::{ApiError, ErrorCode};
pub use handlers::{
    generate_license_handler, get_main_info_handler, health_handler, AppState,
    GenerateLicenseRequest, GenerateLicenseResponse, MainInfoQuery, MainInfoResponse,
};
pub use routes::build_router;
