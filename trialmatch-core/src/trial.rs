//! Trial records

use serde::{Deserialize, Serialize};

use crate::criteria::Criteria;

/// A clinical trial as supplied by the trial registry
///
/// Every field defaults, so a file that omits `description` or even
/// `criteria` still loads; missing criteria leave every rule unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    #[serde(default)]
    pub trial_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub criteria: Criteria,
}

impl Trial {
    pub fn new(trial_id: impl Into<String>, title: impl Into<String>, criteria: Criteria) -> Self {
        Self {
            trial_id: trial_id.into(),
            title: title.into(),
            description: String::new(),
            criteria,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
