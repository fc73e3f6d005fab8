//! Question answering over stored chunks
//!
//! Provides:
//! - Optional query translation before retrieval
//! - Concurrent vector search with id deduplication
//! - Grounded answer generation with citations

mod rag;

pub use rag::{build_context, dedupe_chunks, RagEngine, RagResponse};
