//! Trial Loader
//!
//! Loads trial records from a data directory. Each trial is keyed by its
//! path relative to the data directory (e.g. `trials/egfr.json`).
//!
//! A missing or unreadable file is logged and skipped; the load only fails
//! when nothing at all could be loaded.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrialMatchError};
use crate::trial::Trial;

/// Trial files loaded when no explicit list is given
pub const DEFAULT_TRIAL_FILES: [&str; 5] = [
    "trials/egfr.json",
    "trials/pd-l1.json",
    "trials/kras_g12c.json",
    "trials/combo.json",
    "trials/early_stage.json",
];

/// Loads trial files from a data directory
#[derive(Debug, Clone)]
pub struct TrialLoader {
    /// Root that trial keys are relative to
    data_dir: PathBuf,

    /// Relative paths of the files to load, in load order
    trial_files: Vec<String>,
}

impl TrialLoader {
    /// Create a loader for the default trial files under `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            trial_files: DEFAULT_TRIAL_FILES.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Replace the trial file list
    pub fn with_trial_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trial_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn trial_files(&self) -> &[String] {
        &self.trial_files
    }

    /// Load one trial file given its key relative to the data directory
    pub fn load_file(&self, key: &str) -> Result<Trial> {
        let path = self.data_dir.join(key);
        let content = fs::read_to_string(&path).map_err(|e| TrialMatchError::TrialLoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        parse_trial(&path.display().to_string(), &content)
    }

    /// Load every configured file, skipping the ones that fail
    ///
    /// Returns `(key, trial)` pairs in list order, ready for
    /// [`MatchingEngine::load_trials`](crate::matching::MatchingEngine::load_trials).
    pub fn load(&self) -> Result<Vec<(String, Trial)>> {
        self.load_keys(&self.trial_files)
    }

    /// Discover `*.json` files in a subdirectory of the data directory
    ///
    /// Keys are sorted so discovery order is stable across platforms.
    pub fn discover(&self, subdir: &str) -> Result<Vec<String>> {
        let dir = self.data_dir.join(subdir);
        let entries = fs::read_dir(&dir).map_err(|e| TrialMatchError::TrialLoadError {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut keys: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                path.file_name()
                    .map(|name| relative_key(subdir, &name.to_string_lossy()))
            })
            .collect();
        keys.sort();

        Ok(keys)
    }

    /// Load every `*.json` file found in a subdirectory
    pub fn load_discovered(&self, subdir: &str) -> Result<Vec<(String, Trial)>> {
        let keys = self.discover(subdir)?;
        self.load_keys(&keys)
    }

    fn load_keys(&self, keys: &[String]) -> Result<Vec<(String, Trial)>> {
        let mut loaded = Vec::with_capacity(keys.len());

        for key in keys {
            let path = self.data_dir.join(key);
            if !path.exists() {
                tracing::warn!(file = %key, "trial file not found, skipping");
                continue;
            }

            match self.load_file(key) {
                Ok(trial) => {
                    tracing::debug!(file = %key, trial_id = %trial.trial_id, "loaded trial");
                    loaded.push((key.clone(), trial));
                }
                Err(e) => {
                    tracing::warn!(file = %key, error = %e, "failed to load trial, skipping");
                }
            }
        }

        if loaded.is_empty() {
            return Err(TrialMatchError::NoTrialsLoaded {
                data_dir: self.data_dir.display().to_string(),
            });
        }

        tracing::info!(
            data_dir = %self.data_dir.display(),
            loaded = loaded.len(),
            requested = keys.len(),
            "loaded trials"
        );
        Ok(loaded)
    }
}

/// Parse a trial record; `origin` names the source in errors
pub fn parse_trial(origin: &str, content: &str) -> Result<Trial> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| TrialMatchError::InvalidTrialRecord {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(TrialMatchError::InvalidTrialRecord {
            path: origin.to_string(),
            reason: "expected a JSON object".to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| TrialMatchError::InvalidTrialRecord {
        path: origin.to_string(),
        reason: e.to_string(),
    })
}

fn relative_key(subdir: &str, file_name: &str) -> String {
    let subdir = subdir.trim_matches('/');
    if subdir.is_empty() || subdir == "." {
        file_name.to_string()
    } else {
        format!("{}/{}", subdir, file_name)
    }
}
