use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::duration::format_expiry;
use crate::events::{log_license_event, LicenseEvent};
use crate::registry::{Registry, Validation};
use crate::server::api_error::ApiError;
use crate::server::logging::HealthResponse;

/// Shared application state for handlers.
///
/// The registry lock is held for the whole prune/lookup/mutate/persist
/// sequence of a request, so requests are serialized against each other.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Mutex<Registry>>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// State reading wall-clock time.
    pub fn new(registry: Registry) -> Self {
        Self::with_clock(registry, SystemClock)
    }

    pub fn with_clock(registry: Registry, clock: impl Clock + 'static) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            clock: Arc::new(clock),
        }
    }
}

/// Query string for `GET /GetMainInfo`.
#[derive(Debug, Deserialize)]
pub struct MainInfoQuery {
    pub keyused: Option<String>,
}

/// Body returned when a key is valid.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MainInfoResponse {
    pub valid: bool,
    pub message: String,
    pub expiry_date: String,
}

/// Body of `POST /GenerateLicense`.
#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateLicenseRequest {
    pub duration: Option<String>,
}

/// Body returned for a newly issued license.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLicenseResponse {
    pub license: String,
    pub expiry_date: String,
}

/// Handler for checking a license key.
///
/// - 400 if `keyused` is absent or empty
/// - 404 if the key was never issued
/// - 403 if the key has expired
/// - 200 if the key is valid
pub async fn get_main_info_handler(
    State(state): State<AppState>,
    Query(query): Query<MainInfoQuery>,
) -> Result<Json<MainInfoResponse>, ApiError> {
    let key = match query.keyused.as_deref() {
        Some(key) if !key.is_empty() => key,
        _ => return Err(ApiError::missing_field("keyused", "License key is required")),
    };

    let now = state.clock.now();
    let outcome = state.registry.lock().await.validate_at(key, now)?;

    match outcome {
        Validation::Valid(license) => {
            log_license_event(LicenseEvent::Validated, key, None);
            Ok(Json(MainInfoResponse {
                valid: true,
                message: "License is valid".to_string(),
                expiry_date: format_expiry(&license.expiry_date),
            }))
        }
        Validation::Expired => {
            log_license_event(LicenseEvent::Expired, key, None);
            Err(ApiError::license_expired())
        }
        Validation::NotFound => {
            log_license_event(LicenseEvent::ValidationFailed, key, Some("unknown key"));
            Err(ApiError::license_not_found())
        }
    }
}

/// Handler for issuing a new license.
///
/// Responds 201 with the key and its formatted expiry, or 400 if the body has
/// no usable `duration`.
pub async fn generate_license_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateLicenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerateLicenseResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_request(e.body_text()))?;

    let duration = match request.duration {
        Some(duration) if !duration.is_empty() => duration,
        _ => return Err(ApiError::missing_field("duration", "Duration is required")),
    };

    info!("Generating license for duration '{}'", duration);

    let now = state.clock.now();
    let issued = state.registry.lock().await.generate_at(&duration, now)?;
    let expiry_date = issued.formatted_expiry();

    log_license_event(LicenseEvent::Issued, &issued.key, Some(&expiry_date));

    Ok((
        StatusCode::CREATED,
        Json(GenerateLicenseResponse {
            license: issued.key,
            expiry_date,
        }),
    ))
}

/// Liveness check reporting how many unexpired licenses are held.
///
/// Sweeps expired entries first so the count never includes lapsed licenses.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = state.clock.now();
    let mut registry = state.registry.lock().await;
    registry.prune_at(now);
    Json(HealthResponse::healthy(registry.len()))
}
