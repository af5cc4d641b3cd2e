//! OpenAI-backed text generator.
//!
//! Adapts the pure `openai-client` crate to the [`TextGenerator`] seam.

use async_trait::async_trait;

use openai_client::{
    ChatRequest, FunctionCallRequest, FunctionDef, Message, OpenAIClient,
};

use crate::error::{AcquisitionError, Result};
use crate::traits::generator::{ChatMessage, FunctionSpec, StructuredReply, TextGenerator};

/// [`TextGenerator`] implementation over the OpenAI chat API.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: OpenAIClient,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiGenerator {
    /// Create a generator using `model`.
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn convert(messages: &[ChatMessage]) -> Vec<Message> {
        messages
            .iter()
            .map(|message| Message {
                role: message.role.as_str().to_string(),
                name: message.name.clone(),
                content: message.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut request = ChatRequest::new(&self.model).messages(Self::convert(messages));
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }

        let response = self
            .client
            .chat_completion(request)
            .await
            .map_err(AcquisitionError::generator)?;
        Ok(response.content)
    }

    async fn generate_structured(
        &self,
        messages: &[ChatMessage],
        function: &FunctionSpec,
    ) -> Result<StructuredReply> {
        let mut request = FunctionCallRequest::forced(
            &self.model,
            Self::convert(messages),
            FunctionDef {
                name: function.name.clone(),
                description: function.description.clone(),
                parameters: function.parameters.clone(),
            },
        );
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }

        let response = self
            .client
            .function_call(request)
            .await
            .map_err(AcquisitionError::generator)?;

        Ok(match response.call {
            Some(call) => StructuredReply::Call {
                arguments: call.arguments,
            },
            None => StructuredReply::Text(response.content.unwrap_or_default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_conversion_preserves_names() {
        let messages = [
            ChatMessage::system("be helpful"),
            ChatMessage::system_named("schema", "{}"),
            ChatMessage::user("hello"),
        ];

        let converted = OpenAiGenerator::convert(&messages);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[0].name, None);
        assert_eq!(converted[1].name.as_deref(), Some("schema"));
        assert_eq!(converted[2].role, "user");
    }
}
