//! Pure OpenAI REST API client.
//!
//! A minimal client for the OpenAI chat API with no domain-specific logic.
//! Supports plain chat completions and forced function calling, the two
//! request shapes a structured-generation consumer needs.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{ChatRequest, FunctionCallRequest, FunctionDef, Message, OpenAIClient};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! // Plain chat
//! let reply = client
//!     .chat_completion(ChatRequest::new("gpt-4o").message(Message::user("Hello!")))
//!     .await?;
//!
//! // Forced function call
//! let response = client
//!     .function_call(FunctionCallRequest::forced(
//!         "gpt-4o",
//!         vec![Message::system("Emit the record.")],
//!         FunctionDef {
//!             name: "emit_record".into(),
//!             description: "Emit one normalized record".into(),
//!             parameters: schema,
//!         },
//!     ))
//!     .await?;
//! ```

pub mod error;
pub mod schema;
pub mod types;

pub use error::{OpenAIError, Result};
pub use schema::StructuredOutput;
pub use types::*;

use reqwest::Client;
use tracing::{debug, warn};

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();
        let raw = self.post_chat(&request).await?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OpenAIError::Api {
                status: 200,
                message: "no content in response".into(),
            })?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }

    /// Forced function call.
    ///
    /// Sends the messages with a single function definition and
    /// `function_call = {"name": ...}`. The response separates a structured
    /// call from plain content; deciding what a missing call means is up to
    /// the caller.
    pub async fn function_call(&self, request: FunctionCallRequest) -> Result<FunctionCallResponse> {
        let raw = self.post_chat(&request).await?;

        let message = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| OpenAIError::Api {
                status: 200,
                message: "empty choices in response".into(),
            })?;

        Ok(FunctionCallResponse {
            call: message.function_call,
            content: message.content,
            usage: raw.usage,
        })
    }

    /// POST a request body to `/chat/completions` and parse the raw reply.
    async fn post_chat<B: serde::Serialize>(&self, body: &B) -> Result<types::ChatResponseRaw> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %message, "OpenAI API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://custom.api.com");
        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://custom.api.com");
    }
}
