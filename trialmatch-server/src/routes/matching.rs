//! Matching routes
//!
//! Bodies arrive as raw JSON and go through `PatientSource::parse_records`,
//! so a missing field comes back as `MISSING_PATIENT_FIELDS` naming every
//! absent field, the same as a patient file would.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;

use trialmatch_core::{MatchReport, Patient, PatientSource, TrialMatchError, TrialReport};

use super::{api_error, ApiError};
use crate::AppState;

/// Body flag: return only eligible trials; the summary still counts every trial
pub const ELIGIBLE_ONLY_FIELD: &str = "eligible_only";

/// Body key holding the patient array of a trial-centric request
pub const PATIENTS_FIELD: &str = "patients";

fn invalid_body(reason: impl Into<String>) -> ApiError {
    api_error(TrialMatchError::InvalidPatientRecord {
        row: 0,
        reason: reason.into(),
    })
}

/// Split a `/v1/match` body into the patient record and the `eligible_only` flag
fn split_match_body(mut body: Value) -> Result<(Value, bool), ApiError> {
    let object = body
        .as_object_mut()
        .ok_or_else(|| invalid_body("request body must be a JSON object"))?;

    let eligible_only = match object.remove(ELIGIBLE_ONLY_FIELD) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => flag,
        Some(_) => return Err(invalid_body("eligible_only must be a boolean")),
    };

    Ok((body, eligible_only))
}

/// Match one patient against every loaded trial
pub async fn match_patient(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<MatchReport>, ApiError> {
    let (record, eligible_only) = split_match_body(body)?;
    let patient: Patient = PatientSource::new()
        .parse_records(vec![record])
        .map_err(api_error)?
        .pop()
        .ok_or_else(|| invalid_body("request body holds no patient"))?;

    let results = state.engine.find_matches_for_patient(&patient);
    let report = MatchReport::new(patient.patient_id.clone(), results);
    tracing::debug!(
        patient_id = %report.patient_id,
        eligible = report.summary.eligible,
        total = report.summary.total,
        "patient matched"
    );

    Ok(Json(if eligible_only {
        report.eligible_only()
    } else {
        report
    }))
}

/// Match every given patient against one trial
///
/// `trial_key` is the registry key, URL-encoded (`trials%2Fegfr.json`).
pub async fn match_trial(
    State(state): State<Arc<AppState>>,
    Path(trial_key): Path<String>,
    Json(mut body): Json<Value>,
) -> Result<Json<TrialReport>, ApiError> {
    let records = match body.get_mut(PATIENTS_FIELD).map(Value::take) {
        Some(Value::Array(records)) => records,
        Some(_) => return Err(invalid_body("patients must be an array")),
        None => return Err(invalid_body("request body must carry a patients array")),
    };
    let patients = PatientSource::new().parse_records(records).map_err(api_error)?;

    let report = state
        .engine
        .trial_report(&trial_key, &patients)
        .map_err(api_error)?;

    tracing::debug!(
        trial_key = %report.trial_key,
        eligible = report.summary.eligible,
        total = report.summary.total,
        "trial matched"
    );
    Ok(Json(report))
}
