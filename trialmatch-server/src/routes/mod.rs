//! HTTP route handlers

mod extract;
mod matching;
mod trials;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use trialmatch_core::{ErrorCategory, ErrorDetail, ErrorResponse, TrialMatchError};

use crate::AppState;

pub use extract::{ExtractRequest, ExtractResponse};
pub use matching::{ELIGIBLE_ONLY_FIELD, PATIENTS_FIELD};
pub use trials::{TrialEntry, TrialsResponse};

/// Error half of every handler's return type
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a core error onto its HTTP status and JSON body
pub fn api_error(err: TrialMatchError) -> ApiError {
    let status = StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(code = err.error_code(), "{}", err);
    } else {
        tracing::debug!(code = err.error_code(), "{}", err);
    }
    (status, Json(err.to_error_response()))
}

fn service_unavailable(code: &str, message: impl Into<String>) -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                category: ErrorCategory::External,
                recoverable: false,
            },
        }),
    )
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub trials_loaded: usize,
    pub extraction_enabled: bool,
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        trials_loaded: state.engine.trial_count(),
        extraction_enabled: state.extractor.is_some(),
    })
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>, cors_enabled: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/v1/trials", get(trials::list_trials).put(trials::replace_trials))
        .route("/v1/match", post(matching::match_patient))
        .route("/v1/trials/:trial_key/match", post(matching::match_trial))
        .route("/v1/extract", post(extract::extract_criteria))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
