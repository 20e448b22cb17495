//! Configuration for criteria extraction

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable holding the interpreter API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "TRIALMATCH_LLM_MODEL";
pub const BASE_URL_ENV: &str = "TRIALMATCH_LLM_BASE_URL";
pub const TIMEOUT_ENV: &str = "TRIALMATCH_LLM_TIMEOUT_MS";

/// Extraction and interpreter configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key; never serialized
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Chat model used for interpretation
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; 0 keeps replies repeatable
    #[serde(default)]
    pub temperature: f32,

    /// Upper bound on reply length
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Document prefix sent to the interpreter, in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Retries after the first attempt on transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds, doubled per retry
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_api_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_model() -> String { "gpt-4o-mini".to_string() }
fn default_max_tokens() -> u32 { 1000 }
fn default_max_input_chars() -> usize { 3000 }
fn default_timeout() -> u64 { 30000 }
fn default_max_retries() -> u32 { 2 }
fn default_retry_backoff() -> u64 { 500 }

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            max_input_chars: default_max_input_chars(),
            timeout_ms: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

impl ExtractConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps variable names to values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.api_key = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty());

        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            config.model = model;
        }
        if let Some(base) = lookup(BASE_URL_ENV).filter(|b| !b.trim().is_empty()) {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse() {
                Ok(timeout_ms) => config.timeout_ms = timeout_ms,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid {}", TIMEOUT_ENV),
            }
        }

        config
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_input_chars", &self.max_input_chars)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ExtractConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.max_input_chars, 3000);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ExtractConfig = serde_json::from_str(r#"{"model": "gpt-4o"}"#).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            (API_KEY_ENV, "sk-test"),
            (MODEL_ENV, "local-model"),
            (BASE_URL_ENV, "http://localhost:8080/v1/"),
            (TIMEOUT_ENV, "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = ExtractConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "local-model");
        assert_eq!(config.api_base, "http://localhost:8080/v1");
        assert_eq!(config.timeout_ms, 30000);
    }

    #[test]
    fn test_api_key_never_leaks() {
        let config = ExtractConfig::default().with_api_key("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
        assert!(!serde_json::to_string(&config).unwrap().contains("sk-secret"));
    }
}
