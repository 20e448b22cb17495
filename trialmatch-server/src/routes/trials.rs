//! Trial registry routes

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;
use serde_json::{Map, Value};

use trialmatch_core::{Trial, TrialMatchError};

use super::{api_error, ApiError};
use crate::AppState;

/// One registered trial
#[derive(Debug, Serialize)]
pub struct TrialEntry {
    pub source: String,
    #[serde(flatten)]
    pub trial: Trial,
}

/// Loaded trials in insertion order
#[derive(Debug, Serialize)]
pub struct TrialsResponse {
    pub count: usize,
    pub trials: Vec<TrialEntry>,
}

fn snapshot_response(state: &AppState) -> TrialsResponse {
    let snapshot = state.engine.trials();
    TrialsResponse {
        count: snapshot.len(),
        trials: snapshot
            .iter()
            .map(|entry| TrialEntry {
                source: entry.source.clone(),
                trial: entry.trial.clone(),
            })
            .collect(),
    }
}

/// List the loaded trials
pub async fn list_trials(State(state): State<Arc<AppState>>) -> Json<TrialsResponse> {
    Json(snapshot_response(&state))
}

/// Replace the trial set
///
/// The body maps source keys to trial records; key order is insertion order.
/// Any record that is not a trial object rejects the whole replacement.
pub async fn replace_trials(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<TrialsResponse>, ApiError> {
    let mut trials = Vec::with_capacity(body.len());
    for (source, record) in body {
        if !record.is_object() {
            return Err(api_error(TrialMatchError::InvalidTrialRecord {
                path: source,
                reason: "trial record must be a JSON object".to_string(),
            }));
        }
        let trial: Trial = serde_json::from_value(record).map_err(|e| {
            api_error(TrialMatchError::InvalidTrialRecord {
                path: source.clone(),
                reason: e.to_string(),
            })
        })?;
        trials.push((source, trial));
    }

    state.engine.load_trials(trials);
    Ok(Json(snapshot_response(&state)))
}
