//! Document extraction route

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use trialmatch_core::Trial;
use trialmatch_extract::Extraction;

use super::{service_unavailable, ApiError};
use crate::AppState;

/// Extraction request
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// Document text
    pub text: String,
    /// When set, the response carries a trial record built from the criteria
    #[serde(default)]
    pub trial_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Extraction response
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    #[serde(flatten)]
    pub extraction: Extraction,
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial: Option<Trial>,
}

/// Extract criteria from document text
///
/// Interpreter failures still answer 200 with the conservative fallback.
pub async fn extract_criteria(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let extractor = state.extractor.as_ref().ok_or_else(|| {
        service_unavailable("EXTRACTION_UNAVAILABLE", "no criteria interpreter is configured")
    })?;

    let extraction = extractor.extract(&req.text).await;
    let trial = req.trial_id.map(|trial_id| {
        Trial::new(
            trial_id,
            req.title.unwrap_or_default(),
            extraction.criteria.clone(),
        )
    });

    Ok(Json(ExtractResponse {
        used_fallback: extraction.used_fallback(),
        extraction,
        trial,
    }))
}
