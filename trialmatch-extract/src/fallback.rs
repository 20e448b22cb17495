//! Conservative default criteria
//!
//! When interpretation fails the extractor still returns criteria: advanced
//! stages only, no mutation accepted, ECOG up to 2. The empty mutation list is
//! an accepted set with no members, so a fallback trial matches nobody until a
//! person reviews it.

use serde::{Deserialize, Serialize};

use trialmatch_core::Criteria;

/// Why the fallback was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The interpreter answered but the reply was not a criteria object
    UnparseableReply,
    /// The interpreter call itself failed
    InterpreterFailure,
}

impl FallbackReason {
    fn placeholders(&self) -> (&'static str, &'static str) {
        match self {
            FallbackReason::UnparseableReply => (
                "Unable to parse inclusion criteria",
                "Unable to parse exclusion criteria",
            ),
            FallbackReason::InterpreterFailure => ("Error parsing document", "Error parsing document"),
        }
    }
}

/// The safe default criteria for a failed interpretation
pub fn conservative_criteria(reason: FallbackReason) -> Criteria {
    let (inclusion, exclusion) = reason.placeholders();
    Criteria::builder()
        .stages(["III", "IV"])
        .mutations(Vec::<&str>::new())
        .performance_status_max(2)
        .inclusion(inclusion)
        .exclusion(exclusion)
        .build()
}
