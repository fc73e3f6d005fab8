//! Indexing pipeline
//!
//! Chunking strategies, the token-safety limiter and the ingestion
//! orchestrator that embeds and stores chunks.

mod chunker;
mod paragraph;
mod pipeline;
mod recursive;
mod semantic;
mod task;
mod token_safe;

pub use chunker::{char_len, create_chunker, ChunkingEngine, ChunkingStrategy, StrategyKind};
pub use paragraph::ParagraphChunker;
pub use pipeline::{chunk_id, IngestReport, IngestionService, DEFAULT_BATCH_SIZE, DEFAULT_SOURCE};
pub use recursive::{RecursiveChunker, DEFAULT_SEPARATORS};
pub use semantic::{percentile, split_sentences, SemanticChunker};
pub use task::{IngestionStatus, IngestionTask};
pub use token_safe::{
    enforce_token_limit, TiktokenCounter, TokenCounter, TokenSafeChunker, MIN_TOKEN_LIMIT,
};
