//! Text-generation capability trait.
//!
//! Abstracts the LLM provider behind two operations: free-text generation
//! and structured generation under function-call discipline. Implementations
//! wrap specific providers; the pipeline never talks to a provider directly.

use async_trait::async_trait;

use crate::error::Result;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A role-tagged message sent to the capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,

    /// Optional participant name, used to label attachments (a schema, a
    /// raw record) sent as system messages.
    pub name: Option<String>,

    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            name: None,
            content: content.into(),
        }
    }

    /// Create a named system message (an attachment).
    pub fn system_named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            name: Some(name.into()),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            name: None,
            content: content.into(),
        }
    }
}

/// The function a structured reply must match.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    /// Function name the capability is forced to call.
    pub name: String,

    /// What the function emits.
    pub description: String,

    /// JSON schema of the function's arguments.
    pub parameters: serde_json::Value,
}

/// Reply from a structured-generation call.
///
/// The arguments of a call are surfaced as the raw string the provider
/// produced: providers emit malformed JSON often enough that parse failures
/// must be observable to the caller's retry discipline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredReply {
    /// The capability obeyed the constraint and called the function.
    Call { arguments: String },

    /// The capability ignored the constraint and answered with free text.
    Text(String),
}

/// Text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Free-text completion over role-tagged messages.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Structured completion constrained to `function`'s schema.
    async fn generate_structured(
        &self,
        messages: &[ChatMessage],
        function: &FunctionSpec,
    ) -> Result<StructuredReply>;
}
