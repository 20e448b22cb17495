//! Criteria Extraction Service
//!
//! Turns trial document text into the same [`Criteria`] schema the matching
//! engine consumes:
//!
//! 1. Truncate the document to a bounded prefix
//! 2. Ask the interpreter for a JSON criteria object
//! 3. Unwrap code fences and parse the reply
//! 4. Normalize through the shared criteria normalizer
//! 5. Backfill empty raw inclusion/exclusion lists from a local line scan
//!
//! Every failure degrades to [`conservative_criteria`]; `extract` never fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use trialmatch_core::criteria::normalize_criteria;
use trialmatch_core::{Criteria, Trial};

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::fallback::{conservative_criteria, FallbackReason};
use crate::interpreter::CriteriaInterpreter;
use crate::prompt::{build_prompt, truncate_chars};
use crate::response::parse_reply;
use crate::sections::extract_criteria_sections;

/// Outcome of one extraction
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub criteria: Criteria,

    /// Set when the conservative default replaced the interpreted criteria
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,

    /// Interpreter backend that was asked
    pub interpreter: String,

    /// Whether the document was cut to the configured prefix
    pub truncated: bool,

    pub extracted_at: DateTime<Utc>,
}

impl Extraction {
    pub fn used_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Extracts criteria from document text through an interpreter
#[derive(Clone)]
pub struct CriteriaExtractor {
    interpreter: Arc<dyn CriteriaInterpreter>,
    max_input_chars: usize,
}

impl CriteriaExtractor {
    /// Create an extractor with the default input bound
    pub fn new(interpreter: Arc<dyn CriteriaInterpreter>) -> Self {
        Self {
            interpreter,
            max_input_chars: ExtractConfig::default().max_input_chars,
        }
    }

    /// Create an extractor using the input bound from `config`
    pub fn with_config(interpreter: Arc<dyn CriteriaInterpreter>, config: &ExtractConfig) -> Self {
        Self {
            interpreter,
            max_input_chars: config.max_input_chars,
        }
    }

    pub fn interpreter_name(&self) -> &str {
        self.interpreter.name()
    }

    /// Extract criteria from document text; never fails
    pub async fn extract(&self, text: &str) -> Extraction {
        let (prefix, truncated) = truncate_chars(text, self.max_input_chars);
        if truncated {
            tracing::debug!(
                original_chars = text.chars().count(),
                kept_chars = self.max_input_chars,
                "document truncated for interpretation"
            );
        }

        let prompt = build_prompt(prefix);
        let (criteria, fallback) = match self.interpreter.interpret(&prompt).await {
            Ok(reply) => match parse_reply(&reply) {
                Ok(value) => {
                    let normalized = normalize_criteria(&value);
                    for anomaly in &normalized.anomalies {
                        tracing::info!(
                            field = anomaly.field,
                            "interpreted criteria treated as unconstrained: {}",
                            anomaly.detail
                        );
                    }
                    let mut criteria = normalized.criteria;
                    backfill_raw_lines(&mut criteria, text);
                    (criteria, None)
                }
                Err(e) => fall_back(FallbackReason::UnparseableReply, &e, Some(&reply)),
            },
            Err(e) => fall_back(FallbackReason::InterpreterFailure, &e, None),
        };

        Extraction {
            criteria,
            fallback,
            interpreter: self.interpreter.name().to_string(),
            truncated,
            extracted_at: Utc::now(),
        }
    }

    /// Build a trial record from document text
    ///
    /// Document-derived trials enter the registry through the same schema as
    /// file-loaded ones. Returns the source key with the trial, ready for
    /// [`MatchingEngine::load_trials`](trialmatch_core::MatchingEngine::load_trials).
    pub async fn trial_from_document(
        &self,
        source: &str,
        trial_id: &str,
        title: &str,
        text: &str,
    ) -> (String, Trial, Extraction) {
        let extraction = self.extract(text).await;
        let trial = Trial::new(trial_id, title, extraction.criteria.clone());
        (source.to_string(), trial, extraction)
    }
}

impl std::fmt::Debug for CriteriaExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriteriaExtractor")
            .field("interpreter", &self.interpreter.name())
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

fn fall_back(
    reason: FallbackReason,
    error: &ExtractError,
    reply: Option<&str>,
) -> (Criteria, Option<FallbackReason>) {
    match reply {
        Some(reply) => tracing::warn!(
            error = %error,
            reply = %reply,
            "interpreter reply unusable, using conservative criteria"
        ),
        None => tracing::warn!(error = %error, "interpretation failed, using conservative criteria"),
    }
    (conservative_criteria(reason), Some(reason))
}

/// Fill empty raw lists from the local line scan of the full document
fn backfill_raw_lines(criteria: &mut Criteria, text: &str) {
    if !criteria.raw_inclusion.is_empty() && !criteria.raw_exclusion.is_empty() {
        return;
    }

    let sections = extract_criteria_sections(text);
    if criteria.raw_inclusion.is_empty() {
        criteria.raw_inclusion = sections.inclusion;
    }
    if criteria.raw_exclusion.is_empty() {
        criteria.raw_exclusion = sections.exclusion;
    }
}
