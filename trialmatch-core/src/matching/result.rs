//! Match results and summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one patient against one trial
///
/// Created fresh per evaluation; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Registry key the trial was loaded under
    pub source: String,
    pub trial_id: String,
    pub trial_title: String,
    pub is_match: bool,
    /// Failure reasons in rule order, or the single eligibility sentinel
    pub reasons: Vec<String>,
}

/// Outcome of evaluating one patient for a fixed trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientMatch {
    pub patient_id: String,
    pub is_match: bool,
    pub reasons: Vec<String>,
}

/// Eligible/total counts over a batch of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub total: usize,
    pub eligible: usize,
}

impl MatchSummary {
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut summary = MatchSummary { total: 0, eligible: 0 };
        for is_match in flags {
            summary.total += 1;
            if is_match {
                summary.eligible += 1;
            }
        }
        summary
    }

    pub fn ineligible(&self) -> usize {
        self.total - self.eligible
    }
}

/// A patient's results against the loaded trial set, with a summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub patient_id: String,
    pub generated_at: DateTime<Utc>,
    pub summary: MatchSummary,
    pub results: Vec<MatchResult>,
}

impl MatchReport {
    pub fn new(patient_id: impl Into<String>, results: Vec<MatchResult>) -> Self {
        Self {
            patient_id: patient_id.into(),
            generated_at: Utc::now(),
            summary: MatchSummary::from_flags(results.iter().map(|r| r.is_match)),
            results,
        }
    }

    /// Drop non-matching results; the summary keeps the full counts
    pub fn eligible_only(mut self) -> Self {
        self.results.retain(|r| r.is_match);
        self
    }
}

/// All patients' results for one trial, with a summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialReport {
    pub trial_key: String,
    pub trial_title: String,
    pub generated_at: DateTime<Utc>,
    pub summary: MatchSummary,
    pub results: Vec<PatientMatch>,
}

impl TrialReport {
    pub fn new(trial_key: impl Into<String>, trial_title: impl Into<String>, results: Vec<PatientMatch>) -> Self {
        Self {
            trial_key: trial_key.into(),
            trial_title: trial_title.into(),
            generated_at: Utc::now(),
            summary: MatchSummary::from_flags(results.iter().map(|r| r.is_match)),
            results,
        }
    }
}
