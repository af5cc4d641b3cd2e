//! OpenAI API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Messages
// =============================================================================

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", "assistant"
    pub role: String,

    /// Optional participant name, used to label attachment messages
    /// (e.g. a schema or a raw record sent as a named system message).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Message content
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            name: None,
            content: content.into(),
        }
    }

    /// Create a named system message (an attachment).
    pub fn system_named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            name: Some(name.into()),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            name: None,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            name: None,
            content: content.into(),
        }
    }
}

// =============================================================================
// Chat Completion
// =============================================================================

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model to use (e.g., "gpt-4o", "gpt-4o-mini")
    pub model: String,

    /// Conversation messages
    pub messages: Vec<Message>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            messages: Vec::new(),
            temperature: None,
        }
    }
}

impl ChatRequest {
    /// Create a new chat request with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the conversation.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Replace the conversation messages.
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Response content
    pub content: String,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

// =============================================================================
// Function Calling
// =============================================================================

/// A function the model may be forced to call.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDef {
    /// The name of the function.
    pub name: String,

    /// A description of what the function emits.
    pub description: String,

    /// JSON schema for the function's arguments.
    pub parameters: serde_json::Value,
}

/// Function-calling request with a single forced function.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionCallRequest {
    /// Model to use
    pub model: String,

    /// Conversation messages
    pub messages: Vec<Message>,

    /// Declared functions (exactly the one we force)
    pub functions: Vec<FunctionDef>,

    /// Forces the model to call the named function
    pub function_call: serde_json::Value,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl FunctionCallRequest {
    /// Build a request that forces `function` on every reply.
    pub fn forced(model: impl Into<String>, messages: Vec<Message>, function: FunctionDef) -> Self {
        let function_call = serde_json::json!({ "name": function.name });
        Self {
            model: model.into(),
            messages,
            functions: vec![function],
            function_call,
            temperature: None,
        }
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A function call emitted by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    /// Name of the called function.
    pub name: String,

    /// Arguments as a JSON string. Parsing is the caller's responsibility:
    /// the model can and does emit malformed JSON here.
    pub arguments: String,
}

/// Function-calling response.
///
/// Despite `function_call` being forced, the model occasionally answers with
/// plain content instead; both possibilities are surfaced.
#[derive(Debug, Clone)]
pub struct FunctionCallResponse {
    /// The structured call, when the model obeyed the constraint.
    pub call: Option<FunctionCall>,

    /// Plain content, when it did not.
    pub content: Option<String>,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

// =============================================================================
// Raw wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseRaw {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessageRaw,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessageRaw {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Total tokens used
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_name_skipped_when_absent() {
        let plain = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(plain.get("name").is_none());

        let named = serde_json::to_value(Message::system_named("schema", "{}")).unwrap();
        assert_eq!(named["name"], "schema");
    }

    #[test]
    fn test_forced_function_call_shape() {
        let request = FunctionCallRequest::forced(
            "gpt-4o",
            vec![Message::system("normalize")],
            FunctionDef {
                name: "emit_record".into(),
                description: "Emit the record".into(),
                parameters: serde_json::json!({"type": "object"}),
            },
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["function_call"]["name"], "emit_record");
        assert_eq!(value["functions"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_raw_response_parses_function_call() {
        let raw: ChatResponseRaw = serde_json::from_value(serde_json::json!({
            "choices": [{
                "message": {
                    "content": null,
                    "function_call": {"name": "emit_record", "arguments": "{\"a\": 1}"}
                }
            }]
        }))
        .unwrap();

        let call = raw.choices[0].message.function_call.as_ref().unwrap();
        assert_eq!(call.name, "emit_record");
        assert_eq!(call.arguments, "{\"a\": 1}");
    }
}
