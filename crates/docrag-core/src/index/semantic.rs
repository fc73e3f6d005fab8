//! Embedding-driven chunking at topic shifts

use super::chunker::{ChunkingStrategy, StrategyKind};
use crate::db::cosine_similarity;
use crate::error::{DocRagError, Result};
use crate::llm::Embedder;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.?!]\s+").unwrap();
}

/// Split text after `.`, `?` or `!` followed by whitespace
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        // Keep the terminator, drop the whitespace
        let end = m.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = m.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed(out: &mut Vec<String>, s: &str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s.to_string());
    }
}

/// Percentile with linear interpolation between closest ranks
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Groups consecutive sentences, breaking where the embedding distance to the
/// next sentence is unusually large
pub struct SemanticChunker {
    embedder: Arc<dyn Embedder>,
    breakpoint_percentile: f64,
}

impl SemanticChunker {
    pub fn new(embedder: Arc<dyn Embedder>, breakpoint_percentile: f64) -> Self {
        Self {
            embedder,
            breakpoint_percentile,
        }
    }
}

#[async_trait]
impl ChunkingStrategy for SemanticChunker {
    async fn chunk(&self, text: &str) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return Ok(sentences);
        }

        let vectors = self.embedder.embed_batch(&sentences).await?;
        if vectors.len() != sentences.len() {
            return Err(DocRagError::CountMismatch {
                chunks: sentences.len(),
                vectors: vectors.len(),
            });
        }

        let distances: Vec<f64> = vectors
            .windows(2)
            .map(|pair| 1.0 - cosine_similarity(&pair[0], &pair[1]) as f64)
            .collect();
        let threshold = percentile(&distances, self.breakpoint_percentile);
        debug!(
            "Semantic chunking: {} sentences, breakpoint distance {:.4}",
            sentences.len(),
            threshold
        );

        let mut chunks = Vec::new();
        let mut start = 0;
        for (i, distance) in distances.iter().enumerate() {
            if *distance > threshold {
                chunks.push(sentences[start..=i].join(" "));
                start = i + 1;
            }
        }
        chunks.push(sentences[start..].join(" "));

        Ok(chunks)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Semantic
    }
}
