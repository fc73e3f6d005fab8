//! CLI command handlers

pub mod chunk;
pub mod config;
pub mod ingest;
pub mod pages;
pub mod query;
pub mod reset;

use anyhow::Result;
use docrag_core::{
    Config, Embedder, HttpEmbedder, HttpLanguageModel, LLMClient, LanguageModel,
    SqliteVectorStore, VLLMClient, VectorStore,
};
use std::sync::Arc;

/// External collaborators built once from configuration
pub struct Services {
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn LanguageModel>,
    pub store: Arc<dyn VectorStore>,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client: Arc<dyn LLMClient> = Arc::new(VLLMClient::new(config.llm_service.clone())?);
        let embedder = Arc::new(HttpEmbedder::new(Arc::clone(&client)));
        let llm = Arc::new(HttpLanguageModel::new(
            client,
            config.llm_service.temperature,
        ));
        let store = open_store(config)?;

        Ok(Self {
            embedder,
            llm,
            store: Arc::new(store),
        })
    }
}

/// Open the configured SQLite store
pub fn open_store(config: &Config) -> Result<SqliteVectorStore> {
    let path = config.store.resolved_path();
    tracing::debug!("Opening vector store at {}", path.display());
    Ok(SqliteVectorStore::open(
        &path,
        config.llm_service.embedding_dimensions,
    )?)
}
