//! OpenAI-compatible chat-completions interpreter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ExtractConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::interpreter::{CriteriaInterpreter, Prompt};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Interpreter backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiInterpreter {
    config: ExtractConfig,
    client: Client,
    api_key: String,
}

impl OpenAiInterpreter {
    /// Create an interpreter; fails without an API key
    pub fn new(config: ExtractConfig) -> ExtractResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ExtractError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ExtractError::Config(format!("failed to create HTTP client: {}", e)))?;

        tracing::info!(
            model = %config.model,
            api_base = %config.api_base,
            timeout_ms = config.timeout_ms,
            "criteria interpreter initialized"
        );

        Ok(Self {
            config,
            client,
            api_key,
        })
    }

    /// Create an interpreter from environment configuration
    pub fn from_env() -> ExtractResult<Self> {
        Self::new(ExtractConfig::from_env())
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    async fn send_once(&self, prompt: &Prompt) -> ExtractResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ExtractError::EmptyReply)
    }
}

#[async_trait]
impl CriteriaInterpreter for OpenAiInterpreter {
    fn name(&self) -> &str {
        "openai"
    }

    async fn interpret(&self, prompt: &Prompt) -> ExtractResult<String> {
        let mut backoff_ms = self.config.retry_backoff_ms;
        let mut attempt: u32 = 0;

        loop {
            match self.send_once(prompt).await {
                Ok(reply) => {
                    tracing::debug!(attempt, chars = reply.len(), "interpreter replied");
                    return Ok(reply);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        backoff_ms,
                        error = %e,
                        "retrying interpreter request"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = backoff_ms.saturating_mul(2);
                }
                Err(e) if e.is_transient() => {
                    return Err(ExtractError::RetriesExhausted {
                        attempts: attempt + 1,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for OpenAiInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiInterpreter")
            .field("config", &self.config)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
