//! Service trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    ///
    /// Implementations return exactly one vector per input text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Text generation over a retrieved context
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Answer `prompt` using `context`.
    ///
    /// `system_prompt` replaces the default grounded-answer instructions
    /// when given.
    async fn generate(
        &self,
        prompt: &str,
        context: &str,
        system_prompt: Option<&str>,
    ) -> Result<String>;

    /// Get model name
    fn model_name(&self) -> &str;
}
