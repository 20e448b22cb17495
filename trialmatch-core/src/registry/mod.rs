//! Trial Registry
//!
//! Supplies trial records to the engine, keyed by source identifier.

mod checker;
mod loader;

pub use checker::{
    check_trial_file, check_trial_files, TrialCheckReport, TrialFileCheck, TrialFileStatus,
    REQUIRED_TRIAL_KEYS,
};
pub use loader::{parse_trial, TrialLoader, DEFAULT_TRIAL_FILES};
