//! Trialmatch Extract - criteria extraction from trial documents
//!
//! The extraction service sits beside the matching engine, not inside it:
//! it turns protocol text into the shared criteria schema, and any failure
//! of the underlying interpreter degrades to a conservative default rather
//! than an error.
//!
//! ## Architecture
//!
//! ```text
//!   document text
//!        │
//!        ▼
//!  ┌───────────┐    ┌──────────────────────┐    ┌────────────┐
//!  │  prompt   │───▶│ CriteriaInterpreter  │───▶│  response  │
//!  │ (prefix)  │    │ (OpenAI, test double)│    │  cleanup   │
//!  └───────────┘    └──────────────────────┘    └─────┬──────┘
//!                                                     │
//!                        ┌────────────────────────────┤
//!                        ▼                            ▼
//!                ┌───────────────┐          ┌──────────────────┐
//!                │  normalizer   │          │ conservative     │
//!                │ + line backfill│         │ fallback         │
//!                └───────┬───────┘          └────────┬─────────┘
//!                        └─────────────┬─────────────┘
//!                                      ▼
//!                                  Criteria
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trialmatch_extract::{CriteriaExtractor, OpenAiInterpreter};
//!
//! let interpreter = OpenAiInterpreter::from_env()?;
//! let extractor = CriteriaExtractor::new(Arc::new(interpreter));
//!
//! let extraction = extractor.extract(&protocol_text).await;
//! if extraction.used_fallback() {
//!     eprintln!("criteria need manual review");
//! }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod interpreter;
pub mod openai;
pub mod prompt;
pub mod response;
pub mod sections;

pub use config::ExtractConfig;
pub use error::{ExtractError, ExtractResult};
pub use extractor::{CriteriaExtractor, Extraction};
pub use fallback::{conservative_criteria, FallbackReason};
pub use interpreter::{CriteriaInterpreter, Prompt};
pub use openai::OpenAiInterpreter;
pub use sections::{extract_criteria_sections, CriteriaSections};
