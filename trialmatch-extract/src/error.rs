//! Error types for criteria extraction
//!
//! None of these reach the matching engine: the extractor turns every
//! failure into a conservative fallback. They surface to callers that talk to
//! an interpreter directly.

use thiserror::Error;

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that can occur while interpreting a document
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No API key configured for the interpreter
    #[error("No API key configured. Set OPENAI_API_KEY to enable criteria extraction.")]
    MissingApiKey,

    /// Interpreter configuration is unusable
    #[error("Invalid interpreter configuration: {0}")]
    Config(String),

    /// Transport-level failure (connect, timeout, body read)
    #[error("Interpreter request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Interpreter returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Retries exhausted on transient failures
    #[error("Interpreter unavailable after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The service answered but carried no completion text
    #[error("Interpreter returned an empty reply")]
    EmptyReply,

    /// The reply could not be read as a criteria object
    #[error("Unparseable interpreter reply: {0}")]
    UnparseableReply(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExtractError {
    /// Returns true if the same request might succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            ExtractError::Request(e) => e.is_timeout() || e.is_connect(),
            ExtractError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the failure is in the reply content rather than the call
    pub fn is_reply_error(&self) -> bool {
        matches!(self, ExtractError::UnparseableReply(_) | ExtractError::Serialization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        let rate_limited = ExtractError::Status {
            status: 429,
            body: "slow down".to_string(),
        };
        assert!(rate_limited.is_transient());

        let bad_request = ExtractError::Status {
            status: 400,
            body: "bad".to_string(),
        };
        assert!(!bad_request.is_transient());
        assert!(!ExtractError::MissingApiKey.is_transient());
    }

    #[test]
    fn test_reply_errors() {
        assert!(ExtractError::UnparseableReply("x".to_string()).is_reply_error());
        assert!(!ExtractError::EmptyReply.is_reply_error());
    }
}
