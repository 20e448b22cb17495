//! Error types for trial matching operations
//!
//! The matching engine itself never returns an error: every failure in this
//! module comes from a data-loading collaborator (trial registry, patient
//! source) and is surfaced to the caller before the engine is reached.
//!
//! Each variant has a stable error code (e.g. `MISSING_PATIENT_FIELDS`), a
//! category and an HTTP status mapping so the CLI and the server can report
//! failures consistently.
//!
//! # Example
//!
//! ```rust
//! use trialmatch_core::error::{TrialMatchError, ErrorCategory};
//!
//! let err = TrialMatchError::MissingPatientFields {
//!     missing: vec!["stage".to_string()],
//! };
//! assert_eq!(err.category(), ErrorCategory::Validation);
//! assert_eq!(err.error_code(), "MISSING_PATIENT_FIELDS");
//! assert_eq!(err.http_status_code(), 400);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for trial matching operations
pub type Result<T> = std::result::Result<T, TrialMatchError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Resource not found (404)
    NotFound,
    /// Input validation failed (400)
    Validation,
    /// Internal error (500)
    Internal,
    /// File system or parser failure (502)
    External,
}

/// Errors raised by the data-loading collaborators
#[derive(Error, Debug)]
pub enum TrialMatchError {
    // ═══════════════════════════════════════════════════════════════════════
    // Trial registry errors
    // ═══════════════════════════════════════════════════════════════════════

    /// No trial is registered under the given source key
    #[error("Trial not found: '{trial_key}'. Load the trial set before matching against it.")]
    TrialNotFound { trial_key: String },

    /// A trial file could not be read
    #[error("Failed to load trial from '{path}': {reason}")]
    TrialLoadError { path: String, reason: String },

    /// A trial file was read but is not a trial record
    #[error("Invalid trial record in '{path}': {reason}")]
    InvalidTrialRecord { path: String, reason: String },

    /// Every requested trial file was missing or unreadable
    #[error("No trials loaded from '{data_dir}'. Check the data directory and trial file list.")]
    NoTrialsLoaded { data_dir: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Patient source errors
    // ═══════════════════════════════════════════════════════════════════════

    /// The patient dataset lacks one or more required columns
    #[error("Missing required patient fields: {}. The whole dataset was rejected.", .missing.join(", "))]
    MissingPatientFields { missing: Vec<String> },

    /// A single patient row could not be interpreted
    #[error("Invalid patient record at row {row}: {reason}")]
    InvalidPatientRecord { row: usize, reason: String },

    /// The patient file could not be read
    #[error("Failed to load patients from '{path}': {reason}")]
    PatientLoadError { path: String, reason: String },

    /// Patient id lookup failed
    #[error("Patient not found: '{patient_id}'")]
    PatientNotFound { patient_id: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors
    // ═══════════════════════════════════════════════════════════════════════

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV parsing failed
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error that shouldn't happen
    #[error("Internal error: {reason}. This is a bug; please report it.")]
    InternalError { reason: String },
}

impl TrialMatchError {
    /// Returns true if reloading the same input might succeed
    ///
    /// Only transient file system failures qualify; validation failures need
    /// corrected input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TrialMatchError::IoError(_) | TrialMatchError::TrialLoadError { .. })
    }

    /// Returns true if this error is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(self.http_status_code(), 400..=499)
    }

    /// Returns true if this error is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        matches!(self.http_status_code(), 500..=599)
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            TrialMatchError::TrialNotFound { .. }
            | TrialMatchError::PatientNotFound { .. } => ErrorCategory::NotFound,

            TrialMatchError::InvalidTrialRecord { .. }
            | TrialMatchError::NoTrialsLoaded { .. }
            | TrialMatchError::MissingPatientFields { .. }
            | TrialMatchError::InvalidPatientRecord { .. } => ErrorCategory::Validation,

            TrialMatchError::InternalError { .. } => ErrorCategory::Internal,

            TrialMatchError::TrialLoadError { .. }
            | TrialMatchError::PatientLoadError { .. }
            | TrialMatchError::JsonError(_)
            | TrialMatchError::CsvError(_)
            | TrialMatchError::IoError(_) => ErrorCategory::External,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            TrialMatchError::TrialNotFound { .. } => "TRIAL_NOT_FOUND",
            TrialMatchError::TrialLoadError { .. } => "TRIAL_LOAD_ERROR",
            TrialMatchError::InvalidTrialRecord { .. } => "INVALID_TRIAL_RECORD",
            TrialMatchError::NoTrialsLoaded { .. } => "NO_TRIALS_LOADED",
            TrialMatchError::MissingPatientFields { .. } => "MISSING_PATIENT_FIELDS",
            TrialMatchError::InvalidPatientRecord { .. } => "INVALID_PATIENT_RECORD",
            TrialMatchError::PatientLoadError { .. } => "PATIENT_LOAD_ERROR",
            TrialMatchError::PatientNotFound { .. } => "PATIENT_NOT_FOUND",
            TrialMatchError::JsonError(_) => "JSON_ERROR",
            TrialMatchError::CsvError(_) => "CSV_ERROR",
            TrialMatchError::IoError(_) => "IO_ERROR",
            TrialMatchError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            TrialMatchError::InvalidTrialRecord { .. }
            | TrialMatchError::MissingPatientFields { .. }
            | TrialMatchError::InvalidPatientRecord { .. }
            | TrialMatchError::JsonError(_)
            | TrialMatchError::CsvError(_) => 400,

            TrialMatchError::TrialNotFound { .. }
            | TrialMatchError::PatientNotFound { .. } => 404,

            TrialMatchError::NoTrialsLoaded { .. } => 422,

            TrialMatchError::InternalError { .. } => 500,

            TrialMatchError::TrialLoadError { .. }
            | TrialMatchError::PatientLoadError { .. }
            | TrialMatchError::IoError(_) => 502,
        }
    }

    /// Converts this error to a JSON-serializable response object
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                recoverable: self.is_recoverable(),
            },
        }
    }
}

/// JSON-serializable error response for APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "TRIAL_NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Whether retry might succeed
    pub recoverable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TrialMatchError::TrialNotFound {
                trial_key: "trials/egfr.json".to_string()
            }
            .error_code(),
            "TRIAL_NOT_FOUND"
        );
        assert_eq!(
            TrialMatchError::NoTrialsLoaded {
                data_dir: "data".to_string()
            }
            .error_code(),
            "NO_TRIALS_LOADED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            TrialMatchError::TrialNotFound {
                trial_key: "x".to_string()
            }
            .http_status_code(),
            404
        );
        assert_eq!(
            TrialMatchError::MissingPatientFields {
                missing: vec!["age".to_string()]
            }
            .http_status_code(),
            400
        );
        assert_eq!(
            TrialMatchError::InternalError {
                reason: "x".to_string()
            }
            .http_status_code(),
            500
        );
    }

    #[test]
    fn test_is_client_server_error() {
        let client_err = TrialMatchError::InvalidPatientRecord {
            row: 2,
            reason: "bad age".to_string(),
        };
        assert!(client_err.is_client_error());
        assert!(!client_err.is_server_error());

        let server_err = TrialMatchError::PatientLoadError {
            path: "patients.csv".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(!server_err.is_client_error());
        assert!(server_err.is_server_error());
    }

    #[test]
    fn test_missing_fields_message_lists_every_column() {
        let err = TrialMatchError::MissingPatientFields {
            missing: vec!["stage".to_string(), "smoker".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("stage"));
        assert!(msg.contains("smoker"));
        assert!(msg.contains("rejected"));
    }

    #[test]
    fn test_error_response_serialization() {
        let err = TrialMatchError::TrialNotFound {
            trial_key: "trials/combo.json".to_string(),
        };
        let response = err.to_error_response();

        let json = serde_json::to_string_pretty(&response).unwrap();
        assert!(json.contains("TRIAL_NOT_FOUND"));
        assert!(json.contains("trials/combo.json"));
        assert!(json.contains("not_found"));

        let parsed: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.error.code, "TRIAL_NOT_FOUND");
        assert!(!parsed.error.recoverable);
    }
}
