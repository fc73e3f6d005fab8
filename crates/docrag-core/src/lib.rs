//! docrag Core Library
//!
//! Core functionality for the docrag retrieval-augmented generation engine.
//!
//! # Features
//! - Recursive, paragraph and semantic chunking with a token-safety limiter
//! - Per-page PDF routing between prose extraction and table reconstruction
//! - Query translation (multi-query, step-back, RAG-fusion, HyDE)
//! - SQLite vector store with cosine similarity search
//! - Batched ingestion and grounded answer generation with citations

pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod llm;
pub mod pdf;
pub mod providers;
pub mod search;

pub use config::{
    ChunkingConfig, Config, IngestionConfig, LLMServiceConfig, PdfConfig, RetrievalConfig,
    StoreConfig,
};
pub use db::{DocumentChunk, MetadataFilter, SqliteVectorStore, VectorStore};
pub use error::{DocRagError, Error, Result};
pub use index::{
    create_chunker, ChunkingEngine, ChunkingStrategy, IngestReport, IngestionService,
    IngestionStatus, IngestionTask, StrategyKind,
};
pub use llm::{
    create_translator, Embedder, HttpEmbedder, HttpLanguageModel, LLMClient, LanguageModel,
    QueryTranslator, TranslationStrategy, VLLMClient,
};
pub use pdf::{PageAnalysis, PageLayout, PageStrategyKind, PdfPageRouter};
pub use providers::{load_file, load_pdf, load_url, LoadOutcome, PdfLoader, UrlLoader};
pub use search::{RagEngine, RagResponse};

/// Default data directory name
pub const DATA_DIR_NAME: &str = "docrag";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "docrag";
