//! Trial eligibility criteria
//!
//! Criteria arrive in heterogeneous shapes: trial files written by hand use a
//! bare string for `mutation_required`, extracted criteria use lists, and a
//! language model may emit `"2"` where an integer was expected. Every shape is
//! normalized once, at the boundary, into the canonical types defined here.
//! Rule evaluation only ever sees canonical values.
//!
//! Two sentinels must never be confused:
//!
//! - [`TokenConstraint::Unconstrained`]: the trial imposes no restriction, the
//!   rule always passes.
//! - [`TokenConstraint::OneOf`] with an empty [`TokenSet`]: the trial accepts
//!   nothing, the rule always fails.

mod normalize;

pub use normalize::{normalize_criteria, CriteriaAnomaly, NormalizedCriteria};

use std::fmt;

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical comparison form of a stage or mutation token
fn canonical_token(token: &str) -> String {
    token.trim().to_uppercase()
}

/// An ordered, duplicate-free set of accepted tokens
///
/// Tokens keep their original spelling for display; membership is decided on
/// the trimmed, upper-cased form so "egfr+" and "EGFR+" are the same token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    tokens: Vec<String>,
}

impl TokenSet {
    /// Build a set from raw tokens, trimming and dropping blanks and duplicates
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = TokenSet::default();
        for token in tokens {
            set.insert(token.as_ref());
        }
        set
    }

    fn insert(&mut self, token: &str) -> bool {
        let trimmed = token.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return false;
        }
        self.tokens.push(trimmed.to_string());
        true
    }

    /// Exact, case-insensitive membership
    ///
    /// No partial matching: "III" is not a member of {"IIIA"}.
    pub fn contains(&self, candidate: &str) -> bool {
        let candidate = canonical_token(candidate);
        self.tokens.iter().any(|t| canonical_token(t) == candidate)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Tokens joined for human-readable reasons ("III, IV")
    pub fn display_list(&self) -> String {
        self.tokens.join(", ")
    }
}

/// Normalized form of a set-valued criterion (`stage`, `mutation_required`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenConstraint {
    /// Field absent or unusable: no restriction
    #[default]
    Unconstrained,
    /// Patient value must be one of these tokens
    OneOf(TokenSet),
}

impl TokenConstraint {
    pub fn one_of<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TokenConstraint::OneOf(TokenSet::from_tokens(tokens))
    }

    /// A constraint that accepts no value at all
    pub fn nothing() -> Self {
        TokenConstraint::OneOf(TokenSet::default())
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, TokenConstraint::Unconstrained)
    }
}

impl Serialize for TokenConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TokenConstraint::Unconstrained => serializer.serialize_none(),
            TokenConstraint::OneOf(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for token in set.iter() {
                    seq.serialize_element(token)?;
                }
                seq.end()
            }
        }
    }
}

/// Normalized form of an inclusive numeric upper bound (`performance_status_max`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundConstraint {
    /// Field absent or unusable: no restriction
    #[default]
    Unconstrained,
    /// Patient value must be less than or equal to this bound
    AtMost(i64),
}

impl BoundConstraint {
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, BoundConstraint::Unconstrained)
    }
}

impl Serialize for BoundConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BoundConstraint::Unconstrained => serializer.serialize_none(),
            BoundConstraint::AtMost(max) => serializer.serialize_i64(*max),
        }
    }
}

/// Criteria attached to a trial, in canonical form
///
/// Deserializing never fails on shape: any JSON value is accepted and
/// normalized, with unusable fields degrading to unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Criteria {
    /// Accepted cancer stages
    #[serde(skip_serializing_if = "TokenConstraint::is_unconstrained")]
    pub stage: TokenConstraint,

    /// Accepted mutation statuses
    #[serde(skip_serializing_if = "TokenConstraint::is_unconstrained")]
    pub mutation_required: TokenConstraint,

    /// Highest ECOG performance status admitted
    #[serde(skip_serializing_if = "BoundConstraint::is_unconstrained")]
    pub performance_status_max: BoundConstraint,

    /// Free-text inclusion criteria, shown to users but never evaluated
    pub raw_inclusion: Vec<String>,

    /// Free-text exclusion criteria, shown to users but never evaluated
    pub raw_exclusion: Vec<String>,
}

impl Criteria {
    /// Criteria that restrict nothing
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// Create a new criteria builder
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    /// Normalize an arbitrary JSON value, logging shape anomalies
    pub fn from_value(value: &Value) -> Self {
        let normalized = normalize_criteria(value);
        for anomaly in &normalized.anomalies {
            tracing::info!(field = anomaly.field, "criteria treated as unconstrained: {}", anomaly.detail);
        }
        normalized.criteria
    }

    /// True when no rule can fail
    pub fn is_unconstrained(&self) -> bool {
        self.stage.is_unconstrained()
            && self.mutation_required.is_unconstrained()
            && self.performance_status_max.is_unconstrained()
    }
}

impl<'de> Deserialize<'de> for Criteria {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Criteria::from_value(&value))
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match &self.stage {
            TokenConstraint::Unconstrained => "any".to_string(),
            TokenConstraint::OneOf(set) => format!("[{}]", set.display_list()),
        };
        let mutation = match &self.mutation_required {
            TokenConstraint::Unconstrained => "any".to_string(),
            TokenConstraint::OneOf(set) => format!("[{}]", set.display_list()),
        };
        let ps = match self.performance_status_max {
            BoundConstraint::Unconstrained => "any".to_string(),
            BoundConstraint::AtMost(max) => format!("<= {}", max),
        };
        write!(f, "stage {}, mutation {}, ECOG {}", stage, mutation, ps)
    }
}

/// Builder for [`Criteria`]
#[derive(Debug, Default)]
pub struct CriteriaBuilder {
    criteria: Criteria,
}

impl CriteriaBuilder {
    pub fn stages<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.criteria.stage = TokenConstraint::one_of(stages);
        self
    }

    pub fn mutations<I, S>(mut self, mutations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.criteria.mutation_required = TokenConstraint::one_of(mutations);
        self
    }

    pub fn performance_status_max(mut self, max: i64) -> Self {
        self.criteria.performance_status_max = BoundConstraint::AtMost(max);
        self
    }

    pub fn inclusion(mut self, line: impl Into<String>) -> Self {
        self.criteria.raw_inclusion.push(line.into());
        self
    }

    pub fn exclusion(mut self, line: impl Into<String>) -> Self {
        self.criteria.raw_exclusion.push(line.into());
        self
    }

    pub fn build(self) -> Criteria {
        self.criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_set_exact_case_insensitive() {
        let set = TokenSet::from_tokens(["III", "IV"]);
        assert!(set.contains("iv"));
        assert!(set.contains(" III "));
        assert!(!set.contains("IIIA"));
        assert!(!set.contains("II"));
    }

    #[test]
    fn test_token_set_dedup_keeps_first_spelling() {
        let set = TokenSet::from_tokens(["EGFR+", "egfr+", "", "ALK+"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["EGFR+", "ALK+"]);
    }

    #[test]
    fn test_empty_set_distinct_from_unconstrained() {
        assert_ne!(TokenConstraint::nothing(), TokenConstraint::Unconstrained);
        assert!(!TokenConstraint::nothing().is_unconstrained());
    }

    #[test]
    fn test_serialization_omits_unconstrained_fields() {
        let criteria = Criteria::builder()
            .stages(["III", "IV"])
            .inclusion("Histologically confirmed NSCLC")
            .build();

        let value = serde_json::to_value(&criteria).unwrap();
        assert_eq!(value["stage"], json!(["III", "IV"]));
        assert!(value.get("mutation_required").is_none());
        assert!(value.get("performance_status_max").is_none());
        assert_eq!(value["raw_inclusion"], json!(["Histologically confirmed NSCLC"]));
    }

    #[test]
    fn test_serialized_form_normalizes_to_same_criteria() {
        let criteria = Criteria::builder()
            .stages(["IV"])
            .mutations(Vec::<String>::new())
            .performance_status_max(2)
            .build();

        let json = serde_json::to_string(&criteria).unwrap();
        let parsed: Criteria = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, criteria);
    }

    #[test]
    fn test_display() {
        let criteria = Criteria::builder()
            .stages(["III", "IV"])
            .performance_status_max(1)
            .build();
        assert_eq!(criteria.to_string(), "stage [III, IV], mutation any, ECOG <= 1");
    }
}
