//! Chunk storage
//!
//! The [`VectorStore`] trait is what ingestion and retrieval talk to;
//! [`SqliteVectorStore`] is the bundled implementation.

mod chunk;
mod filter;
mod schema;
pub mod vectors;

pub use chunk::DocumentChunk;
pub use filter::MetadataFilter;
pub use schema::SqliteVectorStore;
pub use vectors::{bytes_to_embedding, cosine_similarity, embedding_to_bytes};

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Persistent similarity-searchable chunk store
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite chunks by id.
    ///
    /// `vectors[i]` belongs to `chunks[i]`. All-or-nothing.
    async fn upsert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<usize>;

    /// Up to `top_k` chunks by descending cosine similarity, `score` set
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<DocumentChunk>>;

    /// Embedding dimension every stored vector has
    fn dimension(&self) -> usize;
}

impl SqliteVectorStore {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::DATA_DIR_NAME)
            .join("chunks.sqlite")
    }
}
