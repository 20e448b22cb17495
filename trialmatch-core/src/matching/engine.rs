//! Matching Engine
//!
//! The engine holds the loaded trial set and nothing else. The set is an
//! immutable snapshot behind an `Arc`; `load_trials` builds a new snapshot and
//! swaps the reference, so a concurrent reader sees either the old set or the
//! new one, never a mix. Evaluation performs no I/O and takes the read lock
//! only long enough to clone the `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::criteria::Criteria;
use crate::error::{Result, TrialMatchError};
use crate::patients::Patient;
use crate::trial::Trial;

use super::result::{MatchResult, PatientMatch, TrialReport};
use super::rules::{evaluate_all, RuleOutcome};

/// Reason reported when every rule passes
pub const ELIGIBLE_REASON: &str = "Meets all inclusion criteria";

/// A trial together with the key it was registered under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTrial {
    /// Source identifier, e.g. "trials/egfr.json"
    pub source: String,
    pub trial: Trial,
}

/// An immutable, insertion-ordered set of trials
#[derive(Debug, Default)]
pub struct TrialSet {
    trials: Vec<RegisteredTrial>,

    /// Index by source key for quick lookup
    by_source: HashMap<String, usize>,
}

impl TrialSet {
    /// Build a set; a repeated key replaces the earlier trial in place
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Trial)>,
    {
        let mut set = TrialSet::default();
        for (source, trial) in entries {
            match set.by_source.get(&source) {
                Some(&idx) => {
                    tracing::debug!(source = %source, "duplicate trial key, keeping the later record");
                    set.trials[idx].trial = trial;
                }
                None => {
                    set.by_source.insert(source.clone(), set.trials.len());
                    set.trials.push(RegisteredTrial { source, trial });
                }
            }
        }
        set
    }

    pub fn get(&self, source: &str) -> Option<&Trial> {
        self.by_source.get(source).map(|&idx| &self.trials[idx].trial)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.by_source.contains_key(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTrial> {
        self.trials.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.trials.iter().map(|t| t.source.as_str())
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// One result per patient for the trial registered under `trial_key`
    pub fn find_patients_for_trial(&self, trial_key: &str, patients: &[Patient]) -> Result<Vec<PatientMatch>> {
        let trial = self.require(trial_key)?;
        Ok(evaluate_patients(trial, patients))
    }

    /// Title, results and summary for one trial, all read from this set
    pub fn trial_report(&self, trial_key: &str, patients: &[Patient]) -> Result<TrialReport> {
        let trial = self.require(trial_key)?;
        Ok(TrialReport::new(
            trial_key,
            trial.title.clone(),
            evaluate_patients(trial, patients),
        ))
    }

    fn require(&self, trial_key: &str) -> Result<&Trial> {
        self.get(trial_key).ok_or_else(|| TrialMatchError::TrialNotFound {
            trial_key: trial_key.to_string(),
        })
    }
}

/// The matching engine: sole authority on eligibility
#[derive(Debug, Default)]
pub struct MatchingEngine {
    trials: RwLock<Arc<TrialSet>>,
}

impl MatchingEngine {
    /// Create an engine with no trials loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine preloaded with trials
    pub fn with_trials<I>(trials: I) -> Self
    where
        I: IntoIterator<Item = (String, Trial)>,
    {
        let engine = Self::new();
        engine.load_trials(trials);
        engine
    }

    /// Replace the trial set (last write wins, no merge)
    ///
    /// Never fails: malformed criteria were already normalized to
    /// unconstrained when the trial records were built.
    pub fn load_trials<I>(&self, trials: I)
    where
        I: IntoIterator<Item = (String, Trial)>,
    {
        let snapshot = Arc::new(TrialSet::from_entries(trials));
        tracing::info!(count = snapshot.len(), "trial set replaced");
        *self.trials.write() = snapshot;
    }

    /// Current trial snapshot; unaffected by later `load_trials` calls
    pub fn trials(&self) -> Arc<TrialSet> {
        Arc::clone(&self.trials.read())
    }

    pub fn trial_count(&self) -> usize {
        self.trials.read().len()
    }

    /// Decide eligibility of one patient for one set of criteria
    ///
    /// Pure: depends only on its arguments. Reasons are the failure reasons in
    /// rule order, or the single [`ELIGIBLE_REASON`] when every rule passes.
    pub fn match_patient_to_trial(&self, patient: &Patient, criteria: &Criteria) -> (bool, Vec<String>) {
        decide(patient, criteria)
    }

    /// Every rule outcome, passes included, in rule order
    pub fn explain(&self, patient: &Patient, criteria: &Criteria) -> Vec<RuleOutcome> {
        evaluate_all(patient, criteria).into_iter().collect()
    }

    /// One result per loaded trial, in insertion order, non-matches included
    pub fn find_matches_for_patient(&self, patient: &Patient) -> Vec<MatchResult> {
        let snapshot = self.trials();
        snapshot
            .iter()
            .map(|entry| {
                let (is_match, reasons) = decide(patient, &entry.trial.criteria);
                MatchResult {
                    source: entry.source.clone(),
                    trial_id: entry.trial.trial_id.clone(),
                    trial_title: entry.trial.title.clone(),
                    is_match,
                    reasons,
                }
            })
            .collect()
    }

    /// One result per patient for the trial registered under `trial_key`
    pub fn find_patients_for_trial(&self, trial_key: &str, patients: &[Patient]) -> Result<Vec<PatientMatch>> {
        self.trials().find_patients_for_trial(trial_key, patients)
    }

    /// [`TrialSet::trial_report`] against the current snapshot
    ///
    /// Title and results come from the same snapshot even if `load_trials`
    /// runs concurrently.
    pub fn trial_report(&self, trial_key: &str, patients: &[Patient]) -> Result<TrialReport> {
        self.trials().trial_report(trial_key, patients)
    }
}

fn evaluate_patients(trial: &Trial, patients: &[Patient]) -> Vec<PatientMatch> {
    patients
        .iter()
        .map(|patient| {
            let (is_match, reasons) = decide(patient, &trial.criteria);
            PatientMatch {
                patient_id: patient.patient_id.clone(),
                is_match,
                reasons,
            }
        })
        .collect()
}

fn decide(patient: &Patient, criteria: &Criteria) -> (bool, Vec<String>) {
    let failures: Vec<String> = evaluate_all(patient, criteria)
        .into_iter()
        .filter(RuleOutcome::is_failed)
        .map(|outcome| outcome.reason)
        .collect();

    if failures.is_empty() {
        (true, vec![ELIGIBLE_REASON.to_string()])
    } else {
        (false, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(stage: &str, mutation: &str, ps: u8) -> Patient {
        Patient {
            patient_id: "P001".to_string(),
            age: 60,
            gender: "F".to_string(),
            stage: stage.to_string(),
            mutation_status: mutation.to_string(),
            smoker: false,
            performance_status: ps,
        }
    }

    fn trial(id: &str, criteria: Criteria) -> Trial {
        Trial::new(id, format!("Trial {}", id), criteria)
    }

    #[test]
    fn test_engine_starts_empty() {
        let engine = MatchingEngine::new();
        assert_eq!(engine.trial_count(), 0);
        assert!(engine.find_matches_for_patient(&patient("IV", "EGFR+", 1)).is_empty());
    }

    #[test]
    fn test_failures_reported_in_rule_order() {
        let engine = MatchingEngine::new();
        let criteria = Criteria::builder()
            .stages(["II"])
            .mutations(["ALK+"])
            .performance_status_max(0)
            .build();

        let (is_match, reasons) = engine.match_patient_to_trial(&patient("IV", "EGFR+", 2), &criteria);
        assert!(!is_match);
        assert_eq!(reasons.len(), 3);
        assert!(reasons[0].starts_with("Stage"));
        assert!(reasons[1].starts_with("Mutation"));
        assert!(reasons[2].starts_with("Performance"));
    }

    #[test]
    fn test_all_pass_yields_single_sentinel() {
        let engine = MatchingEngine::new();
        let (is_match, reasons) =
            engine.match_patient_to_trial(&patient("I", "None", 4), &Criteria::unconstrained());
        assert!(is_match);
        assert_eq!(reasons, vec![ELIGIBLE_REASON.to_string()]);
    }

    #[test]
    fn test_load_replaces_rather_than_merges() {
        let engine = MatchingEngine::new();
        engine.load_trials(vec![
            ("a.json".to_string(), trial("A", Criteria::unconstrained())),
            ("b.json".to_string(), trial("B", Criteria::unconstrained())),
        ]);
        engine.load_trials(vec![("c.json".to_string(), trial("C", Criteria::unconstrained()))]);

        let keys: Vec<String> = engine.trials().keys().map(str::to_string).collect();
        assert_eq!(keys, vec!["c.json"]);
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let engine = MatchingEngine::with_trials(vec![(
            "a.json".to_string(),
            trial("A", Criteria::unconstrained()),
        )]);
        let before = engine.trials();
        engine.load_trials(Vec::new());

        assert_eq!(before.len(), 1);
        assert_eq!(engine.trial_count(), 0);
    }

    #[test]
    fn test_duplicate_key_keeps_later_record_at_first_position() {
        let set = TrialSet::from_entries(vec![
            ("a.json".to_string(), trial("A1", Criteria::unconstrained())),
            ("b.json".to_string(), trial("B", Criteria::unconstrained())),
            ("a.json".to_string(), trial("A2", Criteria::unconstrained())),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["a.json", "b.json"]);
        assert_eq!(set.get("a.json").map(|t| t.trial_id.as_str()), Some("A2"));
    }

    #[test]
    fn test_explain_reports_passes_too() {
        let engine = MatchingEngine::new();
        let criteria = Criteria::builder().stages(["IV"]).build();
        let outcomes = engine.explain(&patient("IV", "EGFR+", 1), &criteria);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.passed));
    }

    #[test]
    fn test_trial_report_reads_one_snapshot() {
        let engine = MatchingEngine::with_trials(vec![(
            "trials/a.json".to_string(),
            trial("A", Criteria::builder().stages(["IV"]).build()),
        )]);
        let snapshot = engine.trials();
        engine.load_trials(vec![(
            "trials/a.json".to_string(),
            trial("B", Criteria::builder().stages(["I"]).build()),
        )]);

        let old = snapshot.trial_report("trials/a.json", &[patient("IV", "EGFR+", 1)]).unwrap();
        assert_eq!(old.trial_title, "Trial A");
        assert!(old.results[0].is_match);
        assert_eq!(old.summary.eligible, 1);

        let new = engine.trial_report("trials/a.json", &[patient("IV", "EGFR+", 1)]).unwrap();
        assert_eq!(new.trial_title, "Trial B");
        assert!(!new.results[0].is_match);
    }

    #[test]
    fn test_find_patients_for_unknown_trial() {
        let engine = MatchingEngine::new();
        let err = engine
            .find_patients_for_trial("trials/missing.json", &[])
            .unwrap_err();
        assert_eq!(err.error_code(), "TRIAL_NOT_FOUND");
    }
}
