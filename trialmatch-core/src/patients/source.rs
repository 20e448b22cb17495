//! Patient Source
//!
//! Loads patient datasets from:
//! - CSV files with a header row
//! - JSON files holding an array of patient objects
//!
//! Column validation happens before any row is parsed: if a required field is
//! missing the whole dataset is rejected and every missing field is named.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, TrialMatchError};

use super::Patient;

/// Fields every patient record must carry, in reporting order
pub const REQUIRED_FIELDS: [&str; 7] = [
    "patient_id",
    "age",
    "gender",
    "stage",
    "mutation_status",
    "smoker",
    "performance_status",
];

/// One CSV data row
///
/// Every CSV field is text, so the identifier is read as written: "007" and
/// "7" stay distinct.
#[derive(Debug, Deserialize)]
struct CsvRow {
    patient_id: String,
    age: u32,
    gender: String,
    stage: String,
    mutation_status: String,
    #[serde(deserialize_with = "super::deserialize_flag")]
    smoker: bool,
    performance_status: u8,
}

impl From<CsvRow> for Patient {
    fn from(row: CsvRow) -> Self {
        Patient {
            patient_id: row.patient_id,
            age: row.age,
            gender: row.gender,
            stage: row.stage,
            mutation_status: row.mutation_status,
            smoker: row.smoker,
            performance_status: row.performance_status,
        }
    }
}

/// Reads patient datasets from disk or memory
#[derive(Debug, Default, Clone, Copy)]
pub struct PatientSource;

impl PatientSource {
    pub fn new() -> Self {
        Self
    }

    /// Load a dataset, choosing the reader from the file extension
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Patient>> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => self.load_json(path),
            Some("csv") | None => self.load_csv(path),
            Some(other) => Err(TrialMatchError::PatientLoadError {
                path: path.display().to_string(),
                reason: format!("unsupported file type '.{}', expected .csv or .json", other),
            }),
        }
    }

    /// Load a CSV dataset with a header row
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Patient>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TrialMatchError::PatientLoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let patients = self.parse_csv(&content)?;
        tracing::info!(path = %path.display(), count = patients.len(), "loaded patients");
        Ok(patients)
    }

    /// Load a JSON dataset (array of objects)
    pub fn load_json<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Patient>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TrialMatchError::PatientLoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let patients = self.parse_json(&content)?;
        tracing::info!(path = %path.display(), count = patients.len(), "loaded patients");
        Ok(patients)
    }

    /// Parse CSV text; row numbers in errors are 1-based data rows
    pub fn parse_csv(&self, content: &str) -> Result<Vec<Patient>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        validate_columns(headers.iter())?;

        let mut patients = Vec::new();
        for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = index + 1;
            let patient: Patient = record
                .map_err(|e| TrialMatchError::InvalidPatientRecord {
                    row,
                    reason: e.to_string(),
                })?
                .into();
            check_ranges(&patient, row)?;
            patients.push(patient);
        }

        Ok(patients)
    }

    /// Parse JSON text holding an array of patient objects
    pub fn parse_json(&self, content: &str) -> Result<Vec<Patient>> {
        let value: Value = serde_json::from_str(content)?;
        let records = match value {
            Value::Array(records) => records,
            other => {
                return Err(TrialMatchError::InvalidPatientRecord {
                    row: 0,
                    reason: format!("expected an array of patients, found {}", json_kind(&other)),
                })
            }
        };

        self.parse_records(records)
    }

    /// Parse already-decoded patient objects
    ///
    /// Missing fields are checked across every record first, so one bad
    /// record rejects the batch and every missing field is named.
    pub fn parse_records(&self, records: Vec<Value>) -> Result<Vec<Patient>> {
        let missing = missing_fields(&records);
        if !missing.is_empty() {
            return Err(TrialMatchError::MissingPatientFields { missing });
        }

        let mut patients = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let row = index + 1;
            let patient: Patient = serde_json::from_value(record).map_err(|e| {
                TrialMatchError::InvalidPatientRecord {
                    row,
                    reason: e.to_string(),
                }
            })?;
            check_ranges(&patient, row)?;
            patients.push(patient);
        }

        Ok(patients)
    }
}

/// Reject a header set that lacks any required field, naming all of them
pub fn validate_columns<'a, I>(columns: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = columns.into_iter().map(str::trim).collect();
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !present.contains(field))
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TrialMatchError::MissingPatientFields { missing })
    }
}

/// Look a patient up by identifier
pub fn find_patient<'a>(patients: &'a [Patient], patient_id: &str) -> Result<&'a Patient> {
    patients
        .iter()
        .find(|p| p.patient_id == patient_id.trim())
        .ok_or_else(|| TrialMatchError::PatientNotFound {
            patient_id: patient_id.to_string(),
        })
}

/// Union of required fields absent from any record, in `REQUIRED_FIELDS` order
fn missing_fields(records: &[Value]) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| {
            records.iter().any(|record| {
                !record
                    .as_object()
                    .map(|o| o.contains_key(**field))
                    .unwrap_or(false)
            })
        })
        .map(|field| field.to_string())
        .collect()
}

fn check_ranges(patient: &Patient, row: usize) -> Result<()> {
    match patient.range_problem() {
        Some(reason) => Err(TrialMatchError::InvalidPatientRecord { row, reason }),
        None => Ok(()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
patient_id,age,gender,stage,mutation_status,smoker,performance_status
P001,65,M,IV,EGFR+,yes,1
P002,54,F,IIIA,None,No,0
";

    #[test]
    fn test_parse_csv() {
        let patients = PatientSource::new().parse_csv(CSV).unwrap();
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].patient_id, "P001");
        assert!(patients[0].smoker);
        assert_eq!(patients[1].stage, "IIIA");
        assert!(!patients[1].smoker);
    }

    #[test]
    fn test_csv_missing_columns_names_all() {
        let csv = "patient_id,age,gender,stage\nP1,50,F,IV\n";
        let err = PatientSource::new().parse_csv(csv).unwrap_err();
        match err {
            TrialMatchError::MissingPatientFields { missing } => {
                assert_eq!(missing, vec!["mutation_status", "smoker", "performance_status"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_csv_bad_ecog_reports_row() {
        let csv = "\
patient_id,age,gender,stage,mutation_status,smoker,performance_status
P001,65,M,IV,EGFR+,yes,1
P002,54,F,IV,None,no,6
";
        let err = PatientSource::new().parse_csv(csv).unwrap_err();
        match err {
            TrialMatchError::InvalidPatientRecord { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_csv_negative_age_rejected() {
        let csv = "\
patient_id,age,gender,stage,mutation_status,smoker,performance_status
P001,-1,M,IV,EGFR+,yes,1
";
        assert!(PatientSource::new().parse_csv(csv).is_err());
    }

    #[test]
    fn test_parse_json_missing_field_rejects_dataset() {
        let json = r#"[
            {"patient_id": "P1", "age": 60, "gender": "F", "stage": "IV",
             "mutation_status": "EGFR+", "smoker": false, "performance_status": 1},
            {"patient_id": "P2", "age": 60, "gender": "F", "stage": "IV",
             "mutation_status": "EGFR+", "smoker": false}
        ]"#;
        let err = PatientSource::new().parse_json(json).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_PATIENT_FIELDS");
        assert!(err.to_string().contains("performance_status"));
    }

    #[test]
    fn test_parse_json_not_array() {
        let err = PatientSource::new().parse_json(r#"{"patient_id": "P1"}"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PATIENT_RECORD");
    }

    #[test]
    fn test_csv_identifiers_keep_leading_zeros() {
        let csv = "\
patient_id,age,gender,stage,mutation_status,smoker,performance_status
007,65,M,IV,EGFR+,yes,1
7,54,F,IIIA,None,no,0
";
        let patients = PatientSource::new().parse_csv(csv).unwrap();
        let ids: Vec<&str> = patients.iter().map(|p| p.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["007", "7"]);
        assert_eq!(find_patient(&patients, "007").unwrap().age, 65);
        assert_eq!(find_patient(&patients, "7").unwrap().age, 54);

        let json = r#"[{"patient_id": "007", "age": 65, "gender": "M", "stage": "IV",
            "mutation_status": "EGFR+", "smoker": "yes", "performance_status": 1}]"#;
        let from_json = PatientSource::new().parse_json(json).unwrap();
        assert_eq!(from_json[0], patients[0]);
    }

    #[test]
    fn test_parse_records_names_every_missing_field() {
        let record = serde_json::json!({
            "patient_id": "P1", "age": 60, "gender": "F",
            "mutation_status": "EGFR+", "smoker": false
        });
        let err = PatientSource::new().parse_records(vec![record]).unwrap_err();
        match err {
            TrialMatchError::MissingPatientFields { missing } => {
                assert_eq!(missing, vec!["stage", "performance_status"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_find_patient() {
        let patients = PatientSource::new().parse_csv(CSV).unwrap();
        assert_eq!(find_patient(&patients, "P002").unwrap().age, 54);
        assert_eq!(
            find_patient(&patients, "P999").unwrap_err().error_code(),
            "PATIENT_NOT_FOUND"
        );
    }
}
