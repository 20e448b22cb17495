//! Prompt construction

use crate::interpreter::Prompt;

pub const SYSTEM_INSTRUCTIONS: &str =
    "You read oncology clinical-trial protocols and answer with a single valid JSON object.";

const USER_TEMPLATE_HEAD: &str = r#"Extract the eligibility criteria from the clinical-trial text below.

Answer with ONLY a JSON object with exactly these keys:
{
  "stage": ["III", "IV"],
  "mutation_required": ["EGFR+"],
  "performance_status_max": 2,
  "raw_inclusion": ["inclusion sentence"],
  "raw_exclusion": ["exclusion sentence"]
}

Field rules:
- stage: cancer stages the trial accepts (I, II, III, IIIA, IIIB, IV)
- mutation_required: biomarkers the patient must carry (EGFR+, KRAS G12C+, PD-L1 High); [] if none
- performance_status_max: highest ECOG performance status allowed, an integer from 0 to 4
- raw_inclusion / raw_exclusion: the key criteria sentences, verbatim

When the text does not say, use stage ["III", "IV"], mutation_required [] and performance_status_max 2.

Clinical trial text:
"#;

/// Longest prefix of `text` holding at most `max_chars` characters
///
/// Cuts on a character boundary; returns whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Build the interpretation prompt for a (pre-truncated) document prefix
pub fn build_prompt(document: &str) -> Prompt {
    let mut user = String::with_capacity(USER_TEMPLATE_HEAD.len() + document.len());
    user.push_str(USER_TEMPLATE_HEAD);
    user.push_str(document);

    Prompt {
        system: SYSTEM_INSTRUCTIONS.to_string(),
        user,
    }
}
