//! Paragraph-boundary chunking with paragraph-aligned overlap

use super::chunker::{char_len, ChunkingStrategy, StrategyKind};
use crate::error::Result;
use async_trait::async_trait;

const PARAGRAPH_BREAK: &str = "\n\n";
const JOINER_LEN: usize = 2;

/// Greedy paragraph packing.
///
/// Lengths are in characters. A paragraph longer than `chunk_size` becomes a
/// chunk on its own; the token-safety wrapper is responsible for it.
#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    chunk_size: usize,
    overlap_size: usize,
}

impl ParagraphChunker {
    pub fn new(chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            chunk_size,
            overlap_size,
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let paragraphs: Vec<&str> = text
            .split(PARAGRAPH_BREAK)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;

        for paragraph in paragraphs {
            let para_len = char_len(paragraph);

            if !current.is_empty() && current_len + para_len + JOINER_LEN > self.chunk_size {
                chunks.push(current.join(PARAGRAPH_BREAK));

                // Seed the next chunk with whole trailing paragraphs
                let mut overlap: Vec<&str> = Vec::new();
                let mut overlap_len = 0;
                for p in current.iter().rev() {
                    let len = char_len(p);
                    if overlap_len + len <= self.overlap_size {
                        overlap.insert(0, p);
                        overlap_len += len;
                    } else {
                        break;
                    }
                }

                current = overlap;
                current_len = overlap_len;
            }

            current.push(paragraph);
            current_len += para_len;
        }

        if !current.is_empty() {
            chunks.push(current.join(PARAGRAPH_BREAK));
        }

        chunks
    }
}

#[async_trait]
impl ChunkingStrategy for ParagraphChunker {
    async fn chunk(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.split(text))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Paragraph
    }
}
