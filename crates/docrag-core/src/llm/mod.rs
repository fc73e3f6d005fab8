//! LLM integration
//!
//! Provides traits and implementations for:
//! - Embedding generation via external services (vLLM, OpenAI, etc.)
//! - Grounded answer generation
//! - Query translation (multi-query, step-back, RAG-fusion, HyDE)

mod client;
mod http_embedder;
mod http_language_model;
mod query_translator;
mod traits;

pub use client::{
    substitute_blank_inputs, ChatMessage, LLMClient, VLLMClient, EMPTY_TEXT_PLACEHOLDER,
};
pub use http_embedder::HttpEmbedder;
pub use http_language_model::{
    build_user_message, default_system_prompt, HttpLanguageModel, REFUSAL_ANSWER,
};
pub use query_translator::{
    create_translator, non_empty_lines, HydeTranslator, MultiQueryTranslator, QueryTranslator,
    RagFusionTranslator, StepBackTranslator, TranslationStrategy,
};
pub use traits::*;
