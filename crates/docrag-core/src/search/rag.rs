//! Retrieval-augmented answering

use crate::config::RetrievalConfig;
use crate::db::{DocumentChunk, MetadataFilter, VectorStore};
use crate::error::Result;
use crate::llm::{create_translator, Embedder, LanguageModel, TranslationStrategy};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer plus the evidence it was generated from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagResponse {
    pub answer: String,
    /// Metadata of every unique chunk placed in the context
    pub citations: Vec<Map<String, Value>>,
    /// Queries actually used for retrieval
    pub generated_queries: Vec<String>,
}

/// Translate, retrieve, deduplicate, generate
pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
    top_k: usize,
}

impl RagEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            top_k: retrieval.top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `query` from stored chunks.
    ///
    /// Without a strategy exactly one search runs with the raw query. The
    /// LLM always receives the original query, never a translation.
    pub async fn answer_question(
        &self,
        query: &str,
        source_filter: Option<&str>,
        strategy: Option<TranslationStrategy>,
    ) -> Result<RagResponse> {
        let queries = self.translate(query, strategy).await?;
        let filter = source_filter
            .filter(|source| !source.is_empty())
            .map(MetadataFilter::source);

        let retrieved = self.retrieve(&queries, filter.as_ref()).await?;
        let unique = dedupe_chunks(retrieved);
        info!(
            "Retrieved {} unique chunks for {} quer{}",
            unique.len(),
            queries.len(),
            if queries.len() == 1 { "y" } else { "ies" }
        );

        let context = build_context(&unique);
        let answer = self.llm.generate(query, &context, None).await?;

        Ok(RagResponse {
            answer,
            citations: unique.into_iter().map(|c| c.metadata).collect(),
            generated_queries: queries,
        })
    }

    async fn translate(
        &self,
        query: &str,
        strategy: Option<TranslationStrategy>,
    ) -> Result<Vec<String>> {
        let Some(strategy) = strategy else {
            return Ok(vec![query.to_string()]);
        };

        let translator = create_translator(strategy, Arc::clone(&self.llm));
        let queries = translator.translate(query).await?;
        if queries.is_empty() {
            warn!("{} produced no queries, using the original", strategy);
            return Ok(vec![query.to_string()]);
        }
        debug!("{} produced {} queries", strategy, queries.len());
        Ok(queries)
    }

    /// Search every query concurrently; results keep query order
    async fn retrieve(
        &self,
        queries: &[String],
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<DocumentChunk>> {
        let searches = queries.iter().map(|q| async move {
            let vector = self.embedder.embed(q).await?;
            self.store.search(&vector, self.top_k, filter).await
        });

        let per_query = try_join_all(searches).await?;
        Ok(per_query.into_iter().flatten().collect())
    }
}

/// Collapse chunks by id, keeping the first occurrence and its position
pub fn dedupe_chunks(chunks: Vec<DocumentChunk>) -> Vec<DocumentChunk> {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| seen.insert(chunk.id.clone()))
        .collect()
}

/// `Source ({source}): {text}` blocks separated by blank lines
pub fn build_context(chunks: &[DocumentChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("Source ({}): {}", c.source().unwrap_or("Unknown"), c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
