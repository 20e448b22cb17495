//! Eligibility matching
//!
//! - [`rules`]: one evaluation function per criterion kind
//! - [`engine`]: orchestration across criteria, trials and patients
//! - [`result`]: result and summary records

pub mod engine;
pub mod result;
pub mod rules;

pub use engine::{MatchingEngine, RegisteredTrial, TrialSet, ELIGIBLE_REASON};
pub use result::{MatchReport, MatchResult, MatchSummary, PatientMatch, TrialReport};
pub use rules::{
    evaluate_all, evaluate_mutation, evaluate_performance_status, evaluate_stage, RuleKind,
    RuleOutcome,
};
