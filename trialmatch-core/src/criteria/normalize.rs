//! Shape normalization for raw criteria values
//!
//! | Raw shape                     | `stage` / `mutation_required` | `performance_status_max` |
//! |-------------------------------|-------------------------------|--------------------------|
//! | absent, `null`                | unconstrained                 | unconstrained            |
//! | string                        | one-element set               | parsed if numeric        |
//! | number                        | one-element set ("4")         | floored integer          |
//! | list                          | set of usable elements        | anomaly                  |
//! | bool, object                  | anomaly                       | anomaly                  |
//!
//! Anomalies never fail: the field degrades to unconstrained and the anomaly
//! is reported back to the caller.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{BoundConstraint, Criteria, TokenConstraint, TokenSet};

const STAGE: &str = "stage";
const MUTATION_REQUIRED: &str = "mutation_required";
const PERFORMANCE_STATUS_MAX: &str = "performance_status_max";
const RAW_INCLUSION: &str = "raw_inclusion";
const RAW_EXCLUSION: &str = "raw_exclusion";

const KNOWN_KEYS: [&str; 5] = [
    STAGE,
    MUTATION_REQUIRED,
    PERFORMANCE_STATUS_MAX,
    RAW_INCLUSION,
    RAW_EXCLUSION,
];

/// A criteria field whose shape could not be used as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriteriaAnomaly {
    pub field: &'static str,
    pub detail: String,
}

impl CriteriaAnomaly {
    fn new(field: &'static str, detail: impl Into<String>) -> Self {
        Self {
            field,
            detail: detail.into(),
        }
    }
}

/// Normalized criteria together with the anomalies met along the way
#[derive(Debug, Clone, Default)]
pub struct NormalizedCriteria {
    pub criteria: Criteria,
    pub anomalies: Vec<CriteriaAnomaly>,
}

impl NormalizedCriteria {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Normalize a raw criteria object of unknown shape
///
/// Total: every input produces a [`Criteria`]. Unknown keys are ignored.
pub fn normalize_criteria(raw: &Value) -> NormalizedCriteria {
    let mut anomalies = Vec::new();

    let object = match raw {
        Value::Object(map) => map,
        Value::Null => {
            return NormalizedCriteria {
                criteria: Criteria::default(),
                anomalies: vec![CriteriaAnomaly::new("criteria", "criteria object is null")],
            }
        }
        other => {
            return NormalizedCriteria {
                criteria: Criteria::default(),
                anomalies: vec![CriteriaAnomaly::new(
                    "criteria",
                    format!("expected an object, found {}", kind_of(other)),
                )],
            }
        }
    };

    for key in object.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            tracing::debug!(key = %key, "ignoring unknown criteria key");
        }
    }

    let criteria = Criteria {
        stage: token_constraint(object, STAGE, &mut anomalies),
        mutation_required: token_constraint(object, MUTATION_REQUIRED, &mut anomalies),
        performance_status_max: bound_constraint(object, PERFORMANCE_STATUS_MAX, &mut anomalies),
        raw_inclusion: text_lines(object, RAW_INCLUSION, &mut anomalies),
        raw_exclusion: text_lines(object, RAW_EXCLUSION, &mut anomalies),
    };

    NormalizedCriteria {
        criteria,
        anomalies,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Render a scalar as a token; `None` for shapes that carry no token
fn scalar_token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn token_constraint(
    object: &Map<String, Value>,
    field: &'static str,
    anomalies: &mut Vec<CriteriaAnomaly>,
) -> TokenConstraint {
    let value = match object.get(field) {
        None | Some(Value::Null) => return TokenConstraint::Unconstrained,
        Some(value) => value,
    };

    match value {
        Value::Array(items) => {
            let mut tokens = Vec::with_capacity(items.len());
            for item in items {
                match scalar_token(item) {
                    Some(token) if !token.trim().is_empty() => tokens.push(token),
                    _ => anomalies.push(CriteriaAnomaly::new(
                        field,
                        format!("dropped unusable element ({})", kind_of(item)),
                    )),
                }
            }
            if !items.is_empty() && tokens.is_empty() {
                // A non-empty list with nothing usable is malformed, not "accept nothing"
                anomalies.push(CriteriaAnomaly::new(field, "no usable tokens in list"));
                return TokenConstraint::Unconstrained;
            }
            TokenConstraint::OneOf(TokenSet::from_tokens(tokens))
        }
        scalar => match scalar_token(scalar) {
            Some(token) if !token.trim().is_empty() => {
                TokenConstraint::OneOf(TokenSet::from_tokens([token]))
            }
            Some(_) => {
                anomalies.push(CriteriaAnomaly::new(field, "blank token"));
                TokenConstraint::Unconstrained
            }
            None => {
                anomalies.push(CriteriaAnomaly::new(
                    field,
                    format!("expected a token or list, found {}", kind_of(scalar)),
                ));
                TokenConstraint::Unconstrained
            }
        },
    }
}

fn bound_constraint(
    object: &Map<String, Value>,
    field: &'static str,
    anomalies: &mut Vec<CriteriaAnomaly>,
) -> BoundConstraint {
    let value = match object.get(field) {
        None | Some(Value::Null) => return BoundConstraint::Unconstrained,
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.floor() as i64)
            })
        }
        _ => None,
    };

    match parsed {
        Some(max) => BoundConstraint::AtMost(max),
        None => {
            anomalies.push(CriteriaAnomaly::new(
                field,
                format!("expected an integer, found {}", kind_of(value)),
            ));
            BoundConstraint::Unconstrained
        }
    }
}

fn text_lines(
    object: &Map<String, Value>,
    field: &'static str,
    anomalies: &mut Vec<CriteriaAnomaly>,
) -> Vec<String> {
    match object.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(line)) => vec![line.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let line = scalar_token(item);
                if line.is_none() {
                    anomalies.push(CriteriaAnomaly::new(
                        field,
                        format!("dropped non-text line ({})", kind_of(item)),
                    ));
                }
                line
            })
            .collect(),
        Some(other) => {
            anomalies.push(CriteriaAnomaly::new(
                field,
                format!("expected text lines, found {}", kind_of(other)),
            ));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_are_unconstrained() {
        let normalized = normalize_criteria(&json!({}));
        assert!(normalized.is_clean());
        assert!(normalized.criteria.is_unconstrained());
        assert!(normalized.criteria.raw_inclusion.is_empty());
    }

    #[test]
    fn test_null_is_unconstrained_empty_list_is_nothing() {
        let normalized = normalize_criteria(&json!({
            "stage": null,
            "mutation_required": []
        }));
        assert_eq!(normalized.criteria.stage, TokenConstraint::Unconstrained);
        assert_eq!(normalized.criteria.mutation_required, TokenConstraint::nothing());
        assert!(normalized.is_clean());
    }

    #[test]
    fn test_scalar_promoted_to_set() {
        let normalized = normalize_criteria(&json!({ "mutation_required": "EGFR+" }));
        assert_eq!(
            normalized.criteria.mutation_required,
            TokenConstraint::one_of(["EGFR+"])
        );
    }

    #[test]
    fn test_numeric_stage_token_becomes_string() {
        let normalized = normalize_criteria(&json!({ "stage": [4, "IV"] }));
        match &normalized.criteria.stage {
            TokenConstraint::OneOf(set) => {
                assert_eq!(set.iter().collect::<Vec<_>>(), vec!["4", "IV"]);
            }
            other => panic!("expected a token set, got {:?}", other),
        }
    }

    #[test]
    fn test_performance_bound_shapes() {
        let cases = [
            (json!(2), BoundConstraint::AtMost(2)),
            (json!("1"), BoundConstraint::AtMost(1)),
            (json!(" 3 "), BoundConstraint::AtMost(3)),
            (json!(2.7), BoundConstraint::AtMost(2)),
            (json!("2.0"), BoundConstraint::AtMost(2)),
            (json!("two"), BoundConstraint::Unconstrained),
            (json!([1]), BoundConstraint::Unconstrained),
            (json!(true), BoundConstraint::Unconstrained),
        ];

        for (raw, expected) in cases {
            let normalized = normalize_criteria(&json!({ "performance_status_max": raw }));
            assert_eq!(normalized.criteria.performance_status_max, expected, "raw = {}", raw);
        }
    }

    #[test]
    fn test_malformed_token_fields_fail_open() {
        let normalized = normalize_criteria(&json!({
            "stage": { "min": "III" },
            "mutation_required": true
        }));
        assert!(normalized.criteria.stage.is_unconstrained());
        assert!(normalized.criteria.mutation_required.is_unconstrained());
        assert_eq!(normalized.anomalies.len(), 2);
        assert_eq!(normalized.anomalies[0].field, "stage");
        assert_eq!(normalized.anomalies[1].field, "mutation_required");
    }

    #[test]
    fn test_list_without_usable_tokens_fails_open() {
        let normalized = normalize_criteria(&json!({ "stage": [null, "  ", {}] }));
        assert!(normalized.criteria.stage.is_unconstrained());
        assert!(!normalized.is_clean());
    }

    #[test]
    fn test_partially_usable_list_keeps_good_tokens() {
        let normalized = normalize_criteria(&json!({ "stage": ["III", null, "IV"] }));
        assert_eq!(normalized.criteria.stage, TokenConstraint::one_of(["III", "IV"]));
        assert_eq!(normalized.anomalies.len(), 1);
    }

    #[test]
    fn test_non_object_criteria() {
        let normalized = normalize_criteria(&json!("stage IV only"));
        assert!(normalized.criteria.is_unconstrained());
        assert_eq!(normalized.anomalies[0].field, "criteria");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let normalized = normalize_criteria(&json!({
            "stage": ["IV"],
            "age_min": 18,
            "histology": "adenocarcinoma"
        }));
        assert!(normalized.is_clean());
        assert_eq!(normalized.criteria.stage, TokenConstraint::one_of(["IV"]));
    }

    #[test]
    fn test_raw_text_lines() {
        let normalized = normalize_criteria(&json!({
            "raw_inclusion": "Age 18 or older",
            "raw_exclusion": ["Prior EGFR TKI", 42, {"x": 1}]
        }));
        assert_eq!(normalized.criteria.raw_inclusion, vec!["Age 18 or older"]);
        assert_eq!(normalized.criteria.raw_exclusion, vec!["Prior EGFR TKI", "42"]);
        assert_eq!(normalized.anomalies.len(), 1);
    }
}
