//! Trial file checker
//!
//! Reports, per trial file, whether it would load and whether its criteria
//! needed normalization. Unlike [`TrialLoader`](super::TrialLoader), the
//! checker never skips silently: every requested file gets a status.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::criteria::normalize_criteria;

/// Keys every trial file must carry
pub const REQUIRED_TRIAL_KEYS: [&str; 2] = ["title", "criteria"];

/// Load status of one trial file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TrialFileStatus {
    Valid,
    MissingKeys(Vec<String>),
    JsonError(String),
    NotFound,
    OtherError(String),
}

impl TrialFileStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, TrialFileStatus::Valid)
    }
}

impl fmt::Display for TrialFileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialFileStatus::Valid => write!(f, "Valid"),
            TrialFileStatus::MissingKeys(keys) => write!(f, "Missing keys: {}", keys.join(", ")),
            TrialFileStatus::JsonError(e) => write!(f, "JSON error: {}", e),
            TrialFileStatus::NotFound => write!(f, "File not found"),
            TrialFileStatus::OtherError(e) => write!(f, "Error: {}", e),
        }
    }
}

/// Check outcome for one file
#[derive(Debug, Clone, Serialize)]
pub struct TrialFileCheck {
    /// Key relative to the data directory
    pub file: String,

    pub status: TrialFileStatus,

    /// Criteria fields that will be treated as unconstrained
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Check outcomes for a list of files
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrialCheckReport {
    pub checks: Vec<TrialFileCheck>,
}

impl TrialCheckReport {
    pub fn is_all_valid(&self) -> bool {
        self.checks.iter().all(|c| c.status.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.checks.iter().filter(|c| c.status.is_valid()).count()
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "{}: {} of {} trial files valid",
            if self.is_all_valid() { "VALID" } else { "INVALID" },
            self.valid_count(),
            self.checks.len()
        )
    }
}

/// Check one trial file
pub fn check_trial_file(data_dir: &Path, file: &str) -> TrialFileCheck {
    let path = data_dir.join(file);
    let mut warnings = Vec::new();

    let status = match fs::read_to_string(&path) {
        Err(e) if e.kind() == ErrorKind::NotFound => TrialFileStatus::NotFound,
        Err(e) => TrialFileStatus::OtherError(e.to_string()),
        Ok(content) => match serde_json::from_str::<Value>(&content) {
            Err(e) => TrialFileStatus::JsonError(e.to_string()),
            Ok(Value::Object(record)) => {
                let missing: Vec<String> = REQUIRED_TRIAL_KEYS
                    .iter()
                    .filter(|key| !record.contains_key(**key))
                    .map(|key| key.to_string())
                    .collect();

                if let Some(criteria) = record.get("criteria") {
                    warnings = normalize_criteria(criteria)
                        .anomalies
                        .into_iter()
                        .map(|a| format!("{}: {}", a.field, a.detail))
                        .collect();
                }

                if missing.is_empty() {
                    TrialFileStatus::Valid
                } else {
                    TrialFileStatus::MissingKeys(missing)
                }
            }
            Ok(_) => TrialFileStatus::OtherError("trial file is not a JSON object".to_string()),
        },
    };

    TrialFileCheck {
        file: file.to_string(),
        status,
        warnings,
    }
}

/// Check every file in order
pub fn check_trial_files<I, S>(data_dir: &Path, files: I) -> TrialCheckReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TrialCheckReport {
        checks: files
            .into_iter()
            .map(|file| check_trial_file(data_dir, file.as_ref()))
            .collect(),
    }
}
