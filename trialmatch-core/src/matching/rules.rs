//! Rule evaluation
//!
//! Rules are evaluated in a fixed order:
//! 1. Stage (patient stage must be an accepted stage token)
//! 2. Mutation (patient mutation status must be an accepted token)
//! 3. Performance status (patient ECOG must not exceed the trial maximum)
//!
//! An unconstrained criterion always passes. Every outcome carries a
//! human-readable reason; failure reasons name what the trial requires and
//! what the patient has.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::criteria::{BoundConstraint, Criteria, TokenConstraint, TokenSet};
use crate::patients::Patient;

/// The kinds of rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Stage,
    Mutation,
    PerformanceStatus,
}

impl RuleKind {
    /// Evaluation order; reasons are always reported in this order
    pub const ORDER: [RuleKind; 3] = [RuleKind::Stage, RuleKind::Mutation, RuleKind::PerformanceStatus];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Stage => "stage",
            RuleKind::Mutation => "mutation",
            RuleKind::PerformanceStatus => "performance_status",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of applying one rule to one patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: RuleKind,
    pub passed: bool,
    pub reason: String,
}

impl RuleOutcome {
    fn pass(rule: RuleKind, reason: String) -> Self {
        Self {
            rule,
            passed: true,
            reason,
        }
    }

    fn fail(rule: RuleKind, reason: String) -> Self {
        Self {
            rule,
            passed: false,
            reason,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    pub fn is_failed(&self) -> bool {
        !self.passed
    }
}

/// Guard against token sets that bypassed the normalizer
fn assert_normalized(rule: RuleKind, set: &TokenSet) {
    for token in set.iter() {
        assert!(
            !token.is_empty() && token.trim() == token,
            "{} rule received a token that is not in normalized form: {:?}",
            rule,
            token
        );
    }
}

/// Stage rule: exact, case-insensitive token membership ("III" does not match "IIIA")
pub fn evaluate_stage(criterion: &TokenConstraint, stage: &str) -> RuleOutcome {
    let rule = RuleKind::Stage;
    match criterion {
        TokenConstraint::Unconstrained => RuleOutcome::pass(rule, "No stage restriction".to_string()),
        TokenConstraint::OneOf(accepted) => {
            assert_normalized(rule, accepted);
            if accepted.contains(stage) {
                RuleOutcome::pass(
                    rule,
                    format!("Stage {} is accepted (trial accepts {})", stage, accepted.display_list()),
                )
            } else if accepted.is_empty() {
                RuleOutcome::fail(
                    rule,
                    format!("Stage mismatch: trial accepts no stage; patient has {}", stage),
                )
            } else {
                RuleOutcome::fail(
                    rule,
                    format!(
                        "Stage mismatch: trial requires {}; patient has {}",
                        accepted.display_list(),
                        stage
                    ),
                )
            }
        }
    }
}

/// Mutation rule: patient mutation status equals one accepted token, ignoring case
pub fn evaluate_mutation(criterion: &TokenConstraint, mutation_status: &str) -> RuleOutcome {
    let rule = RuleKind::Mutation;
    match criterion {
        TokenConstraint::Unconstrained => {
            RuleOutcome::pass(rule, "No mutation requirement".to_string())
        }
        TokenConstraint::OneOf(accepted) => {
            assert_normalized(rule, accepted);
            if accepted.contains(mutation_status) {
                RuleOutcome::pass(
                    rule,
                    format!("Mutation {} matches trial requirement", mutation_status),
                )
            } else if accepted.is_empty() {
                RuleOutcome::fail(
                    rule,
                    format!(
                        "Mutation mismatch: trial accepts no mutation status; patient has {}",
                        mutation_status
                    ),
                )
            } else {
                let required = if accepted.len() == 1 {
                    accepted.display_list()
                } else {
                    format!("one of {}", accepted.display_list())
                };
                RuleOutcome::fail(
                    rule,
                    format!(
                        "Mutation mismatch: trial requires {}; patient has {}",
                        required, mutation_status
                    ),
                )
            }
        }
    }
}

/// Performance-status rule: inclusive upper bound on ECOG
pub fn evaluate_performance_status(criterion: &BoundConstraint, performance_status: u8) -> RuleOutcome {
    let rule = RuleKind::PerformanceStatus;
    match *criterion {
        BoundConstraint::Unconstrained => {
            RuleOutcome::pass(rule, "No performance status limit".to_string())
        }
        BoundConstraint::AtMost(max) if i64::from(performance_status) <= max => RuleOutcome::pass(
            rule,
            format!(
                "Performance status ECOG {} within trial maximum of {}",
                performance_status, max
            ),
        ),
        BoundConstraint::AtMost(max) => RuleOutcome::fail(
            rule,
            format!(
                "Performance status too high: patient ECOG {} exceeds trial maximum of {}",
                performance_status, max
            ),
        ),
    }
}

/// Apply every rule in [`RuleKind::ORDER`]
pub fn evaluate_all(patient: &Patient, criteria: &Criteria) -> [RuleOutcome; 3] {
    let outcomes = [
        evaluate_stage(&criteria.stage, &patient.stage),
        evaluate_mutation(&criteria.mutation_required, &patient.mutation_status),
        evaluate_performance_status(&criteria.performance_status_max, patient.performance_status),
    ];

    for outcome in &outcomes {
        tracing::debug!(
            patient_id = %patient.patient_id,
            rule = %outcome.rule,
            passed = outcome.passed,
            "{}",
            outcome.reason
        );
    }

    outcomes
}
