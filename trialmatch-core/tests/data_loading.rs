//! Trial registry and patient source against files on disk

use std::fs;
use std::path::{Path, PathBuf};

use trialmatch_core::registry::{check_trial_files, TrialFileStatus};
use trialmatch_core::{
    MatchingEngine, PatientSource, TrialLoader, TrialMatchError, DEFAULT_TRIAL_FILES,
};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Fresh scratch directory under the system temp dir
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("trialmatch-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("trials")).unwrap();
    dir
}

#[test]
fn loads_default_trial_files_in_order() {
    let trials = TrialLoader::new(fixtures()).load().unwrap();

    let keys: Vec<&str> = trials.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, DEFAULT_TRIAL_FILES.to_vec());
    assert_eq!(trials[0].1.trial_id, "NCT04035486");
}

#[test]
fn missing_files_are_skipped() {
    let trials = TrialLoader::new(fixtures())
        .with_trial_files(["trials/egfr.json", "trials/does_not_exist.json", "trials/combo.json"])
        .load()
        .unwrap();

    assert_eq!(trials.len(), 2);
    assert_eq!(trials[1].0, "trials/combo.json");
}

#[test]
fn nothing_loaded_is_a_hard_stop() {
    let err = TrialLoader::new(fixtures())
        .with_trial_files(["trials/nope.json"])
        .load()
        .unwrap_err();

    assert!(matches!(err, TrialMatchError::NoTrialsLoaded { .. }));
}

#[test]
fn unparseable_file_is_skipped_and_discovery_is_sorted() {
    let dir = scratch_dir("discover");
    fs::write(dir.join("trials/b.json"), r#"{"title": "B", "criteria": {"stage": "IV"}}"#).unwrap();
    fs::write(dir.join("trials/a.json"), r#"{"title": "A", "criteria": {}}"#).unwrap();
    fs::write(dir.join("trials/broken.json"), "{ this is not json").unwrap();
    fs::write(dir.join("trials/notes.txt"), "ignored").unwrap();

    let loader = TrialLoader::new(&dir);
    let keys = loader.discover("trials").unwrap();
    assert_eq!(keys, vec!["trials/a.json", "trials/b.json", "trials/broken.json"]);

    let trials = loader.load_discovered("trials").unwrap();
    let loaded: Vec<&str> = trials.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(loaded, vec!["trials/a.json", "trials/b.json"]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_reports_every_status() {
    let dir = scratch_dir("check");
    fs::write(dir.join("trials/good.json"), r#"{"title": "G", "criteria": {"stage": ["IV"]}}"#).unwrap();
    fs::write(dir.join("trials/no_criteria.json"), r#"{"title": "N"}"#).unwrap();
    fs::write(dir.join("trials/bad.json"), "[1, 2").unwrap();
    fs::write(
        dir.join("trials/odd.json"),
        r#"{"title": "O", "criteria": {"performance_status_max": [1]}}"#,
    )
    .unwrap();

    let report = check_trial_files(
        &dir,
        [
            "trials/good.json",
            "trials/no_criteria.json",
            "trials/bad.json",
            "trials/missing.json",
            "trials/odd.json",
        ],
    );

    assert_eq!(report.checks[0].status, TrialFileStatus::Valid);
    assert_eq!(
        report.checks[1].status,
        TrialFileStatus::MissingKeys(vec!["criteria".to_string()])
    );
    assert!(matches!(report.checks[2].status, TrialFileStatus::JsonError(_)));
    assert_eq!(report.checks[3].status, TrialFileStatus::NotFound);
    assert!(report.checks[4].status.is_valid());
    assert_eq!(report.checks[4].warnings.len(), 1);
    assert!(!report.is_all_valid());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn fixture_trials_all_check_valid() {
    let report = check_trial_files(&fixtures(), DEFAULT_TRIAL_FILES);
    assert!(report.is_all_valid(), "{}", report.summary());
}

#[test]
fn patient_csv_and_json_agree() {
    let source = PatientSource::new();
    let from_csv = source.load(fixtures().join("patients.csv")).unwrap();
    let from_json = source.load(fixtures().join("patients.json")).unwrap();

    assert_eq!(from_csv.len(), 5);
    assert_eq!(from_csv[..2], from_json[..]);
    assert!(from_csv[2].smoker);
    assert!(from_csv[4].smoker);
}

#[test]
fn patient_file_missing_columns_rejected() {
    let dir = scratch_dir("patients");
    let path = dir.join("patients.csv");
    fs::write(&path, "patient_id,age\nP001,65\n").unwrap();

    let err = PatientSource::new().load(&path).unwrap_err();
    match err {
        TrialMatchError::MissingPatientFields { missing } => assert_eq!(missing.len(), 5),
        other => panic!("unexpected error: {:?}", other),
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unsupported_patient_file_type() {
    let err = PatientSource::new().load("patients.xlsx").unwrap_err();
    assert_eq!(err.error_code(), "PATIENT_LOAD_ERROR");
}

#[test]
fn fixture_data_end_to_end() {
    let engine = MatchingEngine::with_trials(TrialLoader::new(fixtures()).load().unwrap());
    let patients = PatientSource::new().load(fixtures().join("patients.csv")).unwrap();

    let egfr_patient = &patients[0];
    let eligible: Vec<String> = engine
        .find_matches_for_patient(egfr_patient)
        .into_iter()
        .filter(|r| r.is_match)
        .map(|r| r.source)
        .collect();
    assert_eq!(eligible, vec!["trials/egfr.json", "trials/combo.json"]);

    let early = engine.find_patients_for_trial("trials/early_stage.json", &patients).unwrap();
    let early_ids: Vec<&str> = early
        .iter()
        .filter(|m| m.is_match)
        .map(|m| m.patient_id.as_str())
        .collect();
    assert_eq!(early_ids, vec!["P002"]);
}
