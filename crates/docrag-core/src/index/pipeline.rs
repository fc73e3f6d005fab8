//! Ingestion pipeline: chunk, embed in batches, store

use super::chunker::{create_chunker, ChunkingEngine};
use crate::config::ChunkingConfig;
use crate::db::{DocumentChunk, VectorStore};
use crate::error::{DocRagError, Result};
use crate::llm::Embedder;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Source name used when the caller gives none
pub const DEFAULT_SOURCE: &str = "manual_upload";

/// Outcome of one ingestion run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub texts: usize,
    pub chunks: usize,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Orchestrates chunking, embedding and storage for a set of texts
pub struct IngestionService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingConfig,
    batch_size: usize,
}

impl IngestionService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            chunking,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set texts per embedding request (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn chunker(&self) -> Result<ChunkingEngine> {
        create_chunker(
            &self.chunking.strategy,
            Some(Arc::clone(&self.embedder)),
            self.chunking.token_safe,
            &self.chunking,
        )
    }

    /// Chunk every text, embed all chunks and upsert them in one call.
    ///
    /// Nothing is stored unless every chunk received a vector.
    pub async fn ingest_texts(&self, texts: &[String], source: &str) -> Result<IngestReport> {
        let start = Instant::now();
        let chunker = self.chunker()?;
        let strategy = chunker.strategy();

        info!(
            "Ingesting {} text(s) from '{}' with {} chunking",
            texts.len(),
            source,
            strategy
        );

        let mut chunks: Vec<DocumentChunk> = Vec::new();
        for text in texts {
            let pieces = chunker.chunk(text).await?;
            for (index, piece) in pieces.into_iter().enumerate() {
                let metadata = chunk_metadata(source, index, strategy.as_str());
                chunks.push(DocumentChunk::new(chunk_id(source, index), piece, metadata));
            }
        }

        if chunks.is_empty() {
            warn!("No chunks produced for source '{}'", source);
            return Ok(IngestReport {
                source: source.to_string(),
                texts: texts.len(),
                chunks: 0,
                duration: start.elapsed(),
            });
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(contents.len());
        for (batch_idx, batch) in contents.chunks(self.batch_size).enumerate() {
            debug!(
                "Embedding batch {} ({} chunks)",
                batch_idx + 1,
                batch.len()
            );
            vectors.extend(self.embedder.embed_batch(batch).await?);
        }

        if vectors.len() != chunks.len() {
            return Err(DocRagError::CountMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }

        let stored = self.store.upsert(&chunks, &vectors).await?;
        let duration = start.elapsed();
        info!(
            "Stored {} chunks from '{}' in {:.2}s",
            stored,
            source,
            duration.as_secs_f64()
        );

        Ok(IngestReport {
            source: source.to_string(),
            texts: texts.len(),
            chunks: chunks.len(),
            duration,
        })
    }
}

/// `{source}-chunk-{index}-{8 hex chars}`
pub fn chunk_id(source: &str, index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-chunk-{}-{}", source, index, &suffix[..8])
}

fn chunk_metadata(source: &str, index: usize, strategy: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("source".to_string(), json!(source));
    metadata.insert("chunk_index".to_string(), json!(index));
    metadata.insert("strategy".to_string(), json!(strategy));
    metadata
}
