//! Chunking strategies and the factory that composes them

use super::paragraph::ParagraphChunker;
use super::recursive::RecursiveChunker;
use super::semantic::SemanticChunker;
use super::token_safe::{TiktokenCounter, TokenSafeChunker, MIN_TOKEN_LIMIT};
use crate::config::ChunkingConfig;
use crate::error::{DocRagError, Result};
use crate::llm::Embedder;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Length in characters (Unicode scalar values), the unit all chunk sizes use
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Chunking strategy keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Recursive,
    Paragraph,
    Semantic,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Paragraph => "paragraph",
            Self::Semantic => "semantic",
        }
    }

    /// Case-insensitive lookup; `None` for unknown keys
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "recursive" => Some(Self::Recursive),
            "paragraph" => Some(Self::Paragraph),
            "semantic" => Some(Self::Semantic),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a text into an ordered list of chunks
#[async_trait]
pub trait ChunkingStrategy: Send + Sync {
    async fn chunk(&self, text: &str) -> Result<Vec<String>>;

    fn kind(&self) -> StrategyKind;
}

#[async_trait]
impl<S: ChunkingStrategy + ?Sized> ChunkingStrategy for Box<S> {
    async fn chunk(&self, text: &str) -> Result<Vec<String>> {
        (**self).chunk(text).await
    }

    fn kind(&self) -> StrategyKind {
        (**self).kind()
    }
}

/// A configured strategy, optionally wrapped by the token-safety limiter
pub struct ChunkingEngine {
    kind: StrategyKind,
    token_safe: bool,
    inner: Box<dyn ChunkingStrategy>,
}

impl ChunkingEngine {
    /// Strategy actually in use (after any fallback)
    pub fn strategy(&self) -> StrategyKind {
        self.kind
    }

    pub fn is_token_safe(&self) -> bool {
        self.token_safe
    }

    pub async fn chunk(&self, text: &str) -> Result<Vec<String>> {
        self.inner.chunk(text).await
    }
}

impl fmt::Debug for ChunkingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkingEngine")
            .field("kind", &self.kind)
            .field("token_safe", &self.token_safe)
            .finish()
    }
}

/// Build a chunking engine from a strategy key.
///
/// Unknown keys fall back to `recursive`. `semantic` needs an embedder and
/// fails before any service call when none is given.
pub fn create_chunker(
    name: &str,
    embedder: Option<Arc<dyn Embedder>>,
    token_safe: bool,
    config: &ChunkingConfig,
) -> Result<ChunkingEngine> {
    let kind = StrategyKind::parse(name).unwrap_or_else(|| {
        warn!("Unknown chunking strategy '{}', falling back to recursive", name);
        StrategyKind::Recursive
    });

    if kind != StrategyKind::Semantic && config.overlap_size >= config.chunk_size {
        return Err(DocRagError::Configuration(format!(
            "overlap_size ({}) must be smaller than chunk_size ({})",
            config.overlap_size, config.chunk_size
        )));
    }

    if token_safe && config.max_tokens < MIN_TOKEN_LIMIT {
        return Err(DocRagError::Configuration(format!(
            "max_tokens ({}) must be at least {}",
            config.max_tokens, MIN_TOKEN_LIMIT
        )));
    }

    let base: Box<dyn ChunkingStrategy> = match kind {
        StrategyKind::Recursive => Box::new(RecursiveChunker::new(
            config.chunk_size,
            config.overlap_size,
        )),
        StrategyKind::Paragraph => Box::new(ParagraphChunker::new(
            config.chunk_size,
            config.overlap_size,
        )),
        StrategyKind::Semantic => {
            let embedder = embedder.ok_or_else(|| {
                DocRagError::Configuration(
                    "Embedding service is required for semantic chunking".to_string(),
                )
            })?;
            Box::new(SemanticChunker::new(embedder, config.breakpoint_percentile))
        }
    };

    let inner: Box<dyn ChunkingStrategy> = if token_safe {
        let counter = Arc::new(TiktokenCounter::cl100k()?);
        Box::new(TokenSafeChunker::new(base, counter, config.max_tokens))
    } else {
        base
    };

    Ok(ChunkingEngine {
        kind,
        token_safe,
        inner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TokenCounter;

    #[test]
    fn test_char_len_counts_scalars() {
        assert_eq!(char_len("abc"), 3);
        assert_eq!(char_len("日本"), 2);
        assert_eq!(char_len(""), 0);
    }

    #[test]
    fn test_strategy_parse_case_insensitive() {
        assert_eq!(StrategyKind::parse("Paragraph"), Some(StrategyKind::Paragraph));
        assert_eq!(StrategyKind::parse(" SEMANTIC "), Some(StrategyKind::Semantic));
        assert_eq!(StrategyKind::parse("recursive"), Some(StrategyKind::Recursive));
        assert_eq!(StrategyKind::parse("sentence"), None);
    }

    #[test]
    fn test_unknown_strategy_falls_back_to_recursive() {
        let engine = create_chunker("sentence", None, false, &ChunkingConfig::default()).unwrap();
        assert_eq!(engine.strategy(), StrategyKind::Recursive);
        assert!(!engine.is_token_safe());
    }

    #[test]
    fn test_semantic_without_embedder_is_configuration_error() {
        let result = create_chunker("semantic", None, false, &ChunkingConfig::default());
        assert!(matches!(result, Err(DocRagError::Configuration(_))));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let config = ChunkingConfig {
            chunk_size: 100,
            overlap_size: 100,
            ..ChunkingConfig::default()
        };
        let result = create_chunker("paragraph", None, false, &config);
        assert!(matches!(result, Err(DocRagError::Configuration(_))));
    }

    #[test]
    fn test_token_limit_below_one_character_rejected() {
        for max_tokens in [0, 1, 3] {
            let config = ChunkingConfig {
                max_tokens,
                ..ChunkingConfig::default()
            };
            let result = create_chunker("recursive", None, true, &config);
            assert!(matches!(result, Err(DocRagError::Configuration(_))));
        }

        // Without the token limit the value is unused
        let config = ChunkingConfig {
            max_tokens: 1,
            ..ChunkingConfig::default()
        };
        assert!(create_chunker("recursive", None, false, &config).is_ok());
    }

    #[tokio::test]
    async fn test_smallest_token_limit_holds() {
        let config = ChunkingConfig {
            max_tokens: MIN_TOKEN_LIMIT,
            ..ChunkingConfig::default()
        };
        let engine = create_chunker("recursive", None, true, &config).unwrap();
        let counter = TiktokenCounter::cl100k().unwrap();
        let chunks = engine.chunk("日本語のテキスト😀🎉 emoji ünïcödé").await.unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| counter.count(c) <= MIN_TOKEN_LIMIT));
    }

    #[tokio::test]
    async fn test_paragraph_engine_chunks() {
        let engine = create_chunker("paragraph", None, false, &ChunkingConfig::default()).unwrap();
        let chunks = engine.chunk("Paragraph one.\n\nParagraph two.").await.unwrap();
        assert_eq!(chunks, vec!["Paragraph one.\n\nParagraph two."]);
    }

    #[tokio::test]
    async fn test_boxed_strategy_delegates() {
        let boxed: Box<dyn ChunkingStrategy> = Box::new(ParagraphChunker::new(50, 0));
        let wrapped: Box<Box<dyn ChunkingStrategy>> = Box::new(boxed);
        assert_eq!(wrapped.kind(), StrategyKind::Paragraph);
        assert_eq!(wrapped.chunk("a\n\nb").await.unwrap(), vec!["a\n\nb"]);
    }
}
