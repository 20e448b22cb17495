//! # Trialmatch Core - Oncology Trial Eligibility Matching
//!
//! Trialmatch decides, for a patient and a clinical trial, whether the
//! patient is eligible and why not when they are not:
//!
//! - **Criteria**: heterogeneous trial criteria normalized into canonical
//!   token sets and bounds, with "unconstrained" distinct from "accepts nothing"
//! - **Matching**: a deterministic rule evaluator (stage, mutation,
//!   performance status) and an engine that applies it across trials or patients
//! - **Registry / Patients**: loaders that validate input before the engine
//!   ever sees it
//!
//! ## Core Principle
//!
//! > The engine is the sole authority on eligibility.
//!
//! Evaluation is synchronous, performs no I/O and never fails for
//! well-formed records. Malformed criteria degrade the affected rule to
//! unconstrained instead of raising.
//!
//! ## Example
//!
//! ```rust
//! use trialmatch_core::{MatchingEngine, Patient, Trial, ELIGIBLE_REASON};
//! use serde_json::json;
//!
//! let trial: Trial = serde_json::from_value(json!({
//!     "trial_id": "NCT00000001",
//!     "title": "EGFR TKI in Advanced NSCLC",
//!     "criteria": {
//!         "stage": ["III", "IV"],
//!         "mutation_required": "EGFR+",
//!         "performance_status_max": 1
//!     }
//! })).unwrap();
//!
//! let engine = MatchingEngine::new();
//! engine.load_trials(vec![("trials/egfr.json".to_string(), trial)]);
//!
//! let patient: Patient = serde_json::from_value(json!({
//!     "patient_id": "P001",
//!     "age": 64,
//!     "gender": "M",
//!     "stage": "IV",
//!     "mutation_status": "EGFR+",
//!     "smoker": "no",
//!     "performance_status": 1
//! })).unwrap();
//!
//! let results = engine.find_matches_for_patient(&patient);
//! assert!(results[0].is_match);
//! assert_eq!(results[0].reasons, vec![ELIGIBLE_REASON]);
//! ```

pub mod criteria;
pub mod error;
pub mod matching;
pub mod patients;
pub mod registry;
pub mod trial;

// Re-export main types
pub use criteria::{BoundConstraint, Criteria, TokenConstraint, TokenSet};
pub use error::{ErrorCategory, ErrorDetail, ErrorResponse, Result, TrialMatchError};
pub use matching::{
    MatchReport, MatchResult, MatchSummary, MatchingEngine, PatientMatch, RuleKind, RuleOutcome,
    TrialReport, TrialSet, ELIGIBLE_REASON,
};
pub use patients::{Patient, PatientSource};
pub use registry::{TrialLoader, DEFAULT_TRIAL_FILES};
pub use trial::Trial;
