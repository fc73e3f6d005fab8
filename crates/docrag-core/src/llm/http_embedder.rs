//! Chunk and query embeddings from the OpenAI-compatible service

use super::{Embedder, LLMClient};
use crate::config::LLMServiceConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// [`Embedder`] over the embeddings endpoint of an [`LLMClient`].
///
/// Shares the client with the language model so both use one connection pool.
pub struct HttpEmbedder {
    client: Arc<dyn LLMClient>,
}

impl HttpEmbedder {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    /// Own client built from `llm_service`, for commands that only embed
    pub fn from_config(config: LLMServiceConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(super::VLLMClient::new(config)?)))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.client.embedding_dimensions()
    }

    fn model_name(&self) -> &str {
        self.client.embedding_model_name()
    }
}
