//! HTTP client for external LLM services (vLLM, OpenAI, etc.)

use crate::config::LLMServiceConfig;
use crate::error::{DocRagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Placeholder sent in place of blank inputs so the service returns one
/// vector per text.
pub const EMPTY_TEXT_PLACEHOLDER: &str = " ";

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(&self, messages: Vec<ChatMessage>, temperature: f32)
        -> Result<String>;

    /// Generate embeddings for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn embedding_dimensions(&self) -> usize;

    /// Get chat model name
    fn model_name(&self) -> &str;

    /// Get embedding model name
    fn embedding_model_name(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// vLLM/OpenAI-compatible client
pub struct VLLMClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
}

impl VLLMClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http_client.post(url);
        match self.config.api_key {
            Some(ref api_key) => req.header("Authorization", format!("Bearer {}", api_key)),
            None => req,
        }
    }
}

/// Replace blank inputs with a placeholder; embedding APIs reject or drop them
pub fn substitute_blank_inputs(texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .map(|t| {
            if t.trim().is_empty() {
                EMPTY_TEXT_PLACEHOLDER.to_string()
            } else {
                t.clone()
            }
        })
        .collect()
}

#[async_trait]
impl LLMClient for VLLMClient {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest {
            model: String,
            messages: Vec<ChatMessage>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let start = Instant::now();
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.url);
        let response = self.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DocRagError::ExternalService(format!(
                "LLM service error (HTTP {}): {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DocRagError::Llm("No response from LLM".to_string()))?
            .message
            .content;

        tracing::debug!(
            "Chat completion from {} in {}ms",
            self.config.model,
            start.elapsed().as_millis()
        );

        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| DocRagError::Llm("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Serialize)]
        struct EmbedRequest {
            model: String,
            input: Vec<String>,
            dimensions: usize,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            #[serde(default)]
            index: Option<usize>,
            embedding: Vec<f32>,
        }

        let start = Instant::now();
        let request = EmbedRequest {
            model: self.config.embedding_model.clone(),
            input: substitute_blank_inputs(texts),
            dimensions: self.config.embedding_dimensions,
        };

        let url = format!("{}/v1/embeddings", self.config.embeddings_url());
        let response = self.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DocRagError::ExternalService(format!(
                "Embedding service error (HTTP {}): {}",
                status, body
            )));
        }

        let mut embed_response: EmbedResponse = response.json().await?;

        if embed_response.data.len() != texts.len() {
            return Err(DocRagError::CountMismatch {
                chunks: texts.len(),
                vectors: embed_response.data.len(),
            });
        }

        // The API may return entries out of order; `index` restores input order
        embed_response
            .data
            .sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        tracing::debug!(
            "Embedded {} texts with {} in {}ms",
            texts.len(),
            self.config.embedding_model,
            start.elapsed().as_millis()
        );

        Ok(embed_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect())
    }

    fn embedding_dimensions(&self) -> usize {
        self.config.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn embedding_model_name(&self) -> &str {
        &self.config.embedding_model
    }
}
