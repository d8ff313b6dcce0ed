//! Generation service client
//!
//! Dispatches the assembled prompt to an external chat-completion service as
//! a single user-role message and returns the single completion text. The
//! wire format follows the OpenAI-compatible chat completions API that Groq
//! exposes.

use crate::config::LlmConfig;
use crate::error::{CompassError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Transport failure: connection, TLS, or timeout
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Service returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body did not contain a usable completion
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// A single generation request: one user message in, one completion out
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Trait for generation service clients
///
/// The contract is synchronous from the caller's perspective: the future
/// resolves to exactly one completion text or a `GenerationError`. No retry
/// is performed here; callers own that policy.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn complete(&self, request: &GenerationRequest)
        -> std::result::Result<String, GenerationError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Groq chat-completions client
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    /// Construct the client, resolving the API key from the environment
    /// variable named in the configuration
    ///
    /// A missing key is a fatal startup condition, not a per-request error.
    pub fn from_env(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CompassError::MissingCredentials {
                env_var: config.api_key_env.clone(),
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CompassError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: GROQ_BASE_URL.to_string(),
        })
    }

    /// Override the endpoint base URL (used against local test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl GenerationClient for GroqClient {
    async fn complete(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
        };

        tracing::debug!(model = %request.model, "Dispatching generation request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                GenerationError::MalformedResponse("Response contained no completion".to_string())
            })?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionBody {
            model: "llama3-8b-8192",
            messages: vec![ChatMessage {
                role: "user",
                content: "prompt text",
            }],
            temperature: 0.5,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3-8b-8192");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "prompt text");
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Savings Account"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Savings Account");
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let mut config = crate::config::Config::default().llm;
        config.api_key_env = "COMPASS_TEST_ABSENT_KEY".to_string();

        let result = GroqClient::from_env(&config);
        assert!(matches!(
            result,
            Err(CompassError::MissingCredentials { .. })
        ));
    }
}
