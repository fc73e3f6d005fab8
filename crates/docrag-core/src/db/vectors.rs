//! Vector storage operations
//!
//! Stores embeddings as BLOBs and computes cosine similarity in Rust.

use super::{DocumentChunk, MetadataFilter, SqliteVectorStore, VectorStore};
use crate::error::{DocRagError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use serde_json::{Map, Value};
use tracing::debug;

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<usize> {
        if chunks.len() != vectors.len() {
            return Err(DocRagError::CountMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        for vector in vectors {
            self.check_dimension(vector)?;
        }
        if let Some(chunk) = chunks.iter().find(|c| c.text.trim().is_empty()) {
            return Err(DocRagError::InvalidInput(format!(
                "Chunk {} has empty text",
                chunk.id
            )));
        }

        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO {} (id, text, metadata, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                self.table_name()
            ))?;
            for (chunk, vector) in chunks.iter().zip(vectors) {
                let metadata = serde_json::to_string(&chunk.metadata)?;
                stmt.execute(params![
                    chunk.id,
                    chunk.text,
                    metadata,
                    embedding_to_bytes(vector),
                    now
                ])?;
            }
        }
        tx.commit()?;

        debug!("Upserted {} chunks into {}", chunks.len(), self.table_name());
        Ok(chunks.len())
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<DocumentChunk>> {
        self.check_dimension(vector)?;
        let filter = filter.filter(|f| !f.is_empty());

        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, text, metadata, embedding FROM {}",
            self.table_name()
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, text, metadata, embedding) = row?;
            let metadata: Map<String, Value> = serde_json::from_str(&metadata)?;
            if let Some(filter) = filter {
                if !filter.matches(&metadata) {
                    continue;
                }
            }

            let score = cosine_similarity(vector, &bytes_to_embedding(&embedding));
            let mut chunk = DocumentChunk::new(id, text, metadata);
            chunk.score = Some(score);
            scored.push(chunk);
        }

        scored.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .total_cmp(&a.score.unwrap_or(0.0))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    fn dimension(&self) -> usize {
        self.dim()
    }
}

impl SqliteVectorStore {
    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim() {
            return Err(DocRagError::DimensionMismatch {
                expected: self.dim(),
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Convert f32 embedding to bytes (little-endian)
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
