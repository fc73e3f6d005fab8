//! Grounded answer generation over an HTTP chat service

use super::{ChatMessage, LLMClient, LanguageModel};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Answer returned when the context does not contain the information
pub const REFUSAL_ANSWER: &str = "I cannot answer this based on the provided information.";

/// Temperature used when a caller supplies its own system prompt
const OVERRIDE_TEMPERATURE: f32 = 0.7;

/// Default instructions: answer strictly from the supplied context
pub fn default_system_prompt() -> String {
    format!(
        "You are a precise and helpful AI assistant designed to answer questions \
         based strictly on the provided context.\n\n\
         Guidelines:\n\
         1. **Use ONLY the context provided** to answer the user's question.\n\
         2. **Do NOT use outside knowledge**.\n\
         3. If the answer cannot be found in the context, clearly state: '{}'",
        REFUSAL_ANSWER
    )
}

/// Build the user turn sent alongside the system prompt
pub fn build_user_message(prompt: &str, context: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}", context, prompt)
}

/// Language model backed by an OpenAI-compatible chat endpoint
pub struct HttpLanguageModel {
    client: Arc<dyn LLMClient>,
    temperature: f32,
}

impl HttpLanguageModel {
    /// `temperature` is used with the default system prompt only
    pub fn new(client: Arc<dyn LLMClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
        }
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn generate(
        &self,
        prompt: &str,
        context: &str,
        system_prompt: Option<&str>,
    ) -> Result<String> {
        let (system, temperature) = match system_prompt {
            Some(custom) => (custom.to_string(), OVERRIDE_TEMPERATURE),
            None => (default_system_prompt(), self.temperature),
        };

        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(build_user_message(prompt, context)),
        ];

        self.client.chat_completion(messages, temperature).await
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}
