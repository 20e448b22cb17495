//! Inclusion/exclusion line scan
//!
//! A cheap, local pass over the document: lines mentioning "inclusion" or
//! "exclusion" that are longer than a bare heading are kept as candidates.

use serde::Serialize;

/// Lines shorter than this (after trimming) are treated as headings
const MIN_LINE_CHARS: usize = 11;

/// Candidate criteria lines found in a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CriteriaSections {
    pub inclusion: Vec<String>,
    pub exclusion: Vec<String>,
}

impl CriteriaSections {
    pub fn is_empty(&self) -> bool {
        self.inclusion.is_empty() && self.exclusion.is_empty()
    }
}

/// Scan `text` line by line for inclusion and exclusion candidates
///
/// A line mentioning both words counts as inclusion.
pub fn extract_criteria_sections(text: &str) -> CriteriaSections {
    let mut sections = CriteriaSections::default();

    for line in text.lines() {
        let line = line.trim();
        if line.chars().count() < MIN_LINE_CHARS {
            continue;
        }

        let lower = line.to_lowercase();
        if lower.contains("inclusion") {
            sections.inclusion.push(line.to_string());
        } else if lower.contains("exclusion") {
            sections.exclusion.push(line.to_string());
        }
    }

    tracing::debug!(
        inclusion = sections.inclusion.len(),
        exclusion = sections.exclusion.len(),
        "scanned criteria sections"
    );
    sections
}
