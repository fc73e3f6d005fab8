//! Recursive separator-based splitting
//!
//! Tries separators from coarsest to finest. Pieces that still exceed the
//! chunk size are split again with the remaining separators; small pieces are
//! merged back into chunks with a character overlap.

use super::chunker::{char_len, ChunkingStrategy, StrategyKind};
use crate::error::Result;
use async_trait::async_trait;

/// Separators tried in order; the empty separator splits into characters
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    overlap_size: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            chunk_size,
            overlap_size,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();

        // First separator present in the text wins; "" always matches
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut small: Vec<&str> = Vec::new();
        for piece in split_keep_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }

            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }

        chunks
    }

    /// Greedy merge of pieces shorter than `chunk_size`, carrying up to
    /// `overlap_size` characters of trailing pieces forward
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current);

                while total > self.overlap_size
                    || (total + len > self.chunk_size && total > 0)
                {
                    let first = current.remove(0);
                    total -= char_len(first);
                }
            }

            current.push(piece);
            total += len;
        }

        push_joined(&mut chunks, &current);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, pieces: &[&str]) {
    let joined = pieces.concat();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, attaching each separator to the start of the piece
/// that follows it. Empty pieces are dropped.
fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(&text[start..idx]);
        start = idx;
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

#[async_trait]
impl ChunkingStrategy for RecursiveChunker {
    async fn chunk(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.split(text))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Recursive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_split_keeps_separator_at_start() {
        assert_eq!(
            split_keep_separator("a. b. c", ". "),
            vec!["a", ". b", ". c"]
        );
        assert_eq!(split_keep_separator("\n\nx", "\n\n"), vec!["\n\nx"]);
        assert_eq!(split_keep_separator("ab", ""), vec!["a", "b"]);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = RecursiveChunker::new(1000, 200);
        assert_eq!(
            chunker.split("Paragraph one.\n\nParagraph two."),
            vec!["Paragraph one.\n\nParagraph two."]
        );
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        let chunker = RecursiveChunker::new(100, 10);
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let chunker = RecursiveChunker::new(20, 0);
        let chunks = chunker.split("first paragraph\n\nsecond paragraph");
        assert_eq!(chunks, vec!["first paragraph", "second paragraph"]);
    }

    #[test]
    fn test_falls_through_to_words() {
        let chunker = RecursiveChunker::new(10, 0);
        let chunks = chunker.split("alpha beta gamma delta");
        assert_eq!(chunks, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn test_overlap_carries_trailing_pieces() {
        let chunker = RecursiveChunker::new(12, 6);
        let chunks = chunker.split("aa bb cc dd ee ff");
        // Each chunk repeats the tail of the previous one
        assert_eq!(chunks, vec!["aa bb cc dd", "cc dd ee ff"]);
    }

    #[test]
    fn test_unbreakable_text_split_by_characters() {
        let chunker = RecursiveChunker::new(4, 0);
        let chunks = chunker.split("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_multibyte_characters() {
        let chunker = RecursiveChunker::new(3, 0);
        let chunks = chunker.split("日本語日本語");
        assert_eq!(chunks, vec!["日本語", "日本語"]);
    }

    proptest! {
        #[test]
        fn prop_chunks_within_size(
            text in "[a-z .\n]{0,400}",
            chunk_size in 5usize..80,
            overlap_ratio in 0usize..50,
        ) {
            let overlap = chunk_size * overlap_ratio / 100;
            let chunks = RecursiveChunker::new(chunk_size, overlap).split(&text);
            for chunk in &chunks {
                prop_assert!(char_len(chunk) <= chunk_size);
                prop_assert!(!chunk.trim().is_empty());
            }
        }

        #[test]
        fn prop_no_content_lost_without_overlap(
            text in "[a-zé .\n]{0,400}",
            chunk_size in 5usize..80,
        ) {
            let chunks = RecursiveChunker::new(chunk_size, 0).split(&text);
            let rebuilt: String = chunks.iter().map(|c| non_whitespace(c)).collect();
            prop_assert_eq!(rebuilt, non_whitespace(&text));
        }

        #[test]
        fn prop_deterministic(text in "[a-z .\n]{0,200}") {
            let chunker = RecursiveChunker::new(30, 10);
            prop_assert_eq!(chunker.split(&text), chunker.split(&text));
        }
    }
}
