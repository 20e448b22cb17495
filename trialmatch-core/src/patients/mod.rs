//! Patient records and the patient source

mod source;

pub use source::{find_patient, validate_columns, PatientSource, REQUIRED_FIELDS};

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrialMatchError};

/// Highest value on the ECOG scale
pub const ECOG_MAX: u8 = 4;

/// A patient as read from the patient source; immutable once loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(deserialize_with = "deserialize_identifier")]
    pub patient_id: String,
    pub age: u32,
    pub gender: String,
    /// Cancer stage token, e.g. "IIIA"
    pub stage: String,
    /// Biomarker label, e.g. "EGFR+" or "None"
    pub mutation_status: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub smoker: bool,
    /// ECOG performance status, 0 (best) to 4
    pub performance_status: u8,
}

impl Patient {
    /// Check value ranges the type system does not express
    ///
    /// Records that did not come from a file report row 0.
    pub fn validate(&self) -> Result<()> {
        match self.range_problem() {
            Some(reason) => Err(TrialMatchError::InvalidPatientRecord { row: 0, reason }),
            None => Ok(()),
        }
    }

    pub(crate) fn range_problem(&self) -> Option<String> {
        if self.patient_id.trim().is_empty() {
            return Some("patient_id is blank".to_string());
        }
        if self.performance_status > ECOG_MAX {
            return Some(format!(
                "performance_status {} for patient '{}' is outside ECOG 0-{}",
                self.performance_status, self.patient_id, ECOG_MAX
            ));
        }
        None
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, stage {}, {}, ECOG {})",
            self.patient_id, self.age, self.gender, self.stage, self.mutation_status, self.performance_status
        )
    }
}

/// Accept identifiers written as strings or bare numbers
fn deserialize_identifier<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdentifierVisitor;

    impl<'de> Visitor<'de> for IdentifierVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or integer identifier")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
            Ok(v.trim().to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(IdentifierVisitor)
}

/// Lenient boolean: true/false, yes/no, y/n, 1/0 in any case
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean (true/false, yes/no, 1/0)")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<bool, E> {
            match v.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(true),
                "false" | "no" | "n" | "0" => Ok(false),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}
