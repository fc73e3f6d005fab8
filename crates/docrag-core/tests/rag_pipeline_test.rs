//! End-to-end tests for ingestion and question answering
//!
//! Tests:
//! 1. Ingestion assigns ids and metadata and stores every chunk
//! 2. Embedding batches are sequential and bounded
//! 3. Count mismatches abort before anything is stored
//! 4. A plain question issues exactly one unfiltered search
//! 5. Translated queries fan out and results are deduplicated by id
//! 6. Background ingestion reports through its handle

use async_trait::async_trait;
use docrag_core::config::{ChunkingConfig, RetrievalConfig};
use docrag_core::db::{DocumentChunk, MetadataFilter, SqliteVectorStore, VectorStore};
use docrag_core::error::{DocRagError, Result};
use docrag_core::index::{IngestionService, IngestionStatus};
use docrag_core::llm::{Embedder, LanguageModel, TranslationStrategy};
use docrag_core::search::RagEngine;
use serde_json::{json, Map};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const DIM: usize = 4;

/// Deterministic embedder: known texts map to fixed vectors, others hash
struct MockEmbedder {
    known: HashMap<String, Vec<f32>>,
    batch_sizes: Mutex<Vec<usize>>,
    drop_last: bool,
}

impl MockEmbedder {
    fn new() -> Self {
        Self {
            known: HashMap::new(),
            batch_sizes: Mutex::new(Vec::new()),
            drop_last: false,
        }
    }

    fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.known.insert(text.to_string(), vector);
        self
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.known.get(text) {
            return v.clone();
        }
        let sum: u32 = text.bytes().map(u32::from).sum();
        vec![1.0, (sum % 7) as f32, (text.len() % 5) as f32, 0.5]
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_sizes.lock().unwrap().push(texts.len());
        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| self.vector_for(t)).collect();
        if self.drop_last {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "mock-embedder"
    }
}

/// Records every call, answers searches from a script keyed by the first
/// vector component or falls through to an in-memory SQLite store
struct RecordingStore {
    inner: SqliteVectorStore,
    scripted: HashMap<u32, Vec<DocumentChunk>>,
    searches: Mutex<Vec<(Vec<f32>, usize, Option<MetadataFilter>)>>,
    upserts: Mutex<Vec<usize>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: SqliteVectorStore::open_in_memory(DIM).unwrap(),
            scripted: HashMap::new(),
            searches: Mutex::new(Vec::new()),
            upserts: Mutex::new(Vec::new()),
        }
    }

    fn script(mut self, key: u32, ids: &[&str]) -> Self {
        let chunks = ids
            .iter()
            .map(|id| {
                let mut metadata = Map::new();
                metadata.insert("source".to_string(), json!("doc1"));
                metadata.insert("id".to_string(), json!(id));
                DocumentChunk::new(*id, format!("text of {}", id), metadata)
            })
            .collect();
        self.scripted.insert(key, chunks);
        self
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn upsert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<usize> {
        self.upserts.lock().unwrap().push(chunks.len());
        self.inner.upsert(chunks, vectors).await
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<DocumentChunk>> {
        self.searches
            .lock()
            .unwrap()
            .push((vector.to_vec(), top_k, filter.cloned()));
        if let Some(chunks) = self.scripted.get(&(vector[0] as u32)) {
            return Ok(chunks.clone());
        }
        self.inner.search(vector, top_k, filter).await
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Translation calls get `translation`; answer calls get `answer`
struct MockLlm {
    translation: String,
    answer: String,
    answer_calls: Mutex<Vec<(String, String)>>,
}

impl MockLlm {
    fn new(translation: &str) -> Self {
        Self {
            translation: translation.to_string(),
            answer: "The answer.".to_string(),
            answer_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LanguageModel for MockLlm {
    async fn generate(
        &self,
        prompt: &str,
        context: &str,
        system_prompt: Option<&str>,
    ) -> Result<String> {
        if system_prompt.is_some() {
            return Ok(self.translation.clone());
        }
        self.answer_calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), context.to_string()));
        Ok(self.answer.clone())
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}

fn paragraph_config() -> ChunkingConfig {
    ChunkingConfig {
        strategy: "paragraph".to_string(),
        chunk_size: 1000,
        overlap_size: 200,
        token_safe: false,
        ..ChunkingConfig::default()
    }
}

#[tokio::test]
async fn test_ingest_single_paragraph_document() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let service = IngestionService::new(embedder.clone(), store.clone(), paragraph_config());

    let report = service
        .ingest_texts(&["Paragraph one.\n\nParagraph two.".to_string()], "doc1")
        .await
        .unwrap();

    assert_eq!(report.chunks, 1);
    assert_eq!(report.texts, 1);
    assert_eq!(report.source, "doc1");
    assert_eq!(*store.upserts.lock().unwrap(), vec![1]);

    let query = embedder.vector_for("Paragraph one.\n\nParagraph two.");
    let results = store.inner.search(&query, 5, None).await.unwrap();
    assert_eq!(results.len(), 1);
    let chunk = &results[0];
    assert_eq!(chunk.source(), Some("doc1"));
    assert_eq!(chunk.chunk_index(), Some(0));
    assert_eq!(chunk.strategy(), Some("paragraph"));
    assert!(chunk.id.starts_with("doc1-chunk-0-"));
}

#[tokio::test]
async fn test_ingest_batches_sequentially() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let config = ChunkingConfig {
        chunk_size: 20,
        overlap_size: 0,
        ..paragraph_config()
    };
    let service =
        IngestionService::new(embedder.clone(), store.clone(), config).with_batch_size(2);

    let text = (0..5)
        .map(|i| format!("Paragraph number {}.", i))
        .collect::<Vec<_>>()
        .join("\n\n");
    let report = service.ingest_texts(&[text], "doc1").await.unwrap();

    assert_eq!(report.chunks, 5);
    assert_eq!(*embedder.batch_sizes.lock().unwrap(), vec![2, 2, 1]);
    assert_eq!(*store.upserts.lock().unwrap(), vec![5]);
    assert_eq!(store.inner.count().unwrap(), 5);
}

#[tokio::test]
async fn test_count_mismatch_stores_nothing() {
    let mut embedder = MockEmbedder::new();
    embedder.drop_last = true;
    let store = Arc::new(RecordingStore::new());
    let service = IngestionService::new(Arc::new(embedder), store.clone(), paragraph_config());

    let result = service
        .ingest_texts(&["Some text.".to_string()], "doc1")
        .await;

    assert!(matches!(result, Err(DocRagError::CountMismatch { .. })));
    assert!(store.upserts.lock().unwrap().is_empty());
    assert_eq!(store.inner.count().unwrap(), 0);
}

#[tokio::test]
async fn test_empty_input_makes_no_calls() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let service = IngestionService::new(embedder.clone(), store.clone(), paragraph_config());

    let report = service
        .ingest_texts(&["   ".to_string()], "doc1")
        .await
        .unwrap();

    assert_eq!(report.chunks, 0);
    assert!(embedder.batch_sizes.lock().unwrap().is_empty());
    assert!(store.upserts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_chunking_config_fails_before_service_calls() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let config = ChunkingConfig {
        chunk_size: 100,
        overlap_size: 100,
        ..paragraph_config()
    };
    let service = IngestionService::new(embedder.clone(), store.clone(), config);

    let result = service.ingest_texts(&["text".to_string()], "doc1").await;
    assert!(matches!(result, Err(DocRagError::Configuration(_))));
    assert!(embedder.batch_sizes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_plain_question_issues_one_search() {
    let embedder = Arc::new(MockEmbedder::new().with("What is X?", vec![9.0, 0.0, 0.0, 1.0]));
    let store = Arc::new(RecordingStore::new().script(9, &["a"]));
    let llm = Arc::new(MockLlm::new("unused"));
    let retrieval = RetrievalConfig { top_k: 5 };
    let engine = RagEngine::new(embedder, store.clone(), llm.clone(), &retrieval);

    let response = engine.answer_question("What is X?", None, None).await.unwrap();

    let searches = store.searches.lock().unwrap();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].0, vec![9.0, 0.0, 0.0, 1.0]);
    assert_eq!(searches[0].1, 5);
    assert!(searches[0].2.is_none());

    assert_eq!(response.answer, "The answer.");
    assert_eq!(response.generated_queries, vec!["What is X?".to_string()]);
    assert_eq!(response.citations.len(), 1);
    assert_eq!(response.citations[0]["id"], "a");

    let calls = llm.answer_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "What is X?");
    assert_eq!(calls[0].1, "Source (doc1): text of a");
}

#[tokio::test]
async fn test_source_filter_is_passed_to_search() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let llm = Arc::new(MockLlm::new("unused"));
    let engine = RagEngine::new(embedder, store.clone(), llm, &RetrievalConfig::default());

    engine
        .answer_question("anything", Some("report.pdf"), None)
        .await
        .unwrap();

    let searches = store.searches.lock().unwrap();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].1, RetrievalConfig::default().top_k);
    let filter = serde_json::to_value(searches[0].2.as_ref().unwrap()).unwrap();
    assert_eq!(filter, json!({"source": {"$eq": "report.pdf"}}));
}

#[tokio::test]
async fn test_empty_source_filter_searches_everything() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let llm = Arc::new(MockLlm::new("unused"));
    let engine = RagEngine::new(embedder, store.clone(), llm, &RetrievalConfig::default());

    engine.answer_question("anything", Some(""), None).await.unwrap();

    let searches = store.searches.lock().unwrap();
    assert_eq!(searches.len(), 1);
    assert!(searches[0].2.is_none());
}

#[tokio::test]
async fn test_translated_queries_are_deduplicated() {
    let embedder = Arc::new(
        MockEmbedder::new()
            .with("first phrasing", vec![1.0, 0.0, 0.0, 0.0])
            .with("second phrasing", vec![2.0, 0.0, 0.0, 0.0]),
    );
    let store = Arc::new(
        RecordingStore::new()
            .script(1, &["a", "b"])
            .script(2, &["a", "c"]),
    );
    let llm = Arc::new(MockLlm::new("first phrasing\n\nsecond phrasing\n"));
    let engine = RagEngine::new(embedder, store.clone(), llm.clone(), &RetrievalConfig::default());

    let response = engine
        .answer_question("original?", None, Some(TranslationStrategy::MultiQuery))
        .await
        .unwrap();

    assert_eq!(store.searches.lock().unwrap().len(), 2);
    assert_eq!(
        response.generated_queries,
        vec!["first phrasing".to_string(), "second phrasing".to_string()]
    );

    let ids: Vec<&str> = response
        .citations
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let calls = llm.answer_calls.lock().unwrap();
    assert_eq!(calls[0].0, "original?");
    assert_eq!(
        calls[0].1,
        "Source (doc1): text of a\n\nSource (doc1): text of b\n\nSource (doc1): text of c"
    );
}

#[tokio::test]
async fn test_empty_translation_falls_back_to_original() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let llm = Arc::new(MockLlm::new("   \n"));
    let engine = RagEngine::new(embedder, store.clone(), llm, &RetrievalConfig::default());

    let response = engine
        .answer_question("original?", None, Some(TranslationStrategy::Hyde))
        .await
        .unwrap();

    assert_eq!(response.generated_queries, vec!["original?".to_string()]);
    assert_eq!(store.searches.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ingest_then_answer_round_trip() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let service = IngestionService::new(embedder.clone(), store.clone(), paragraph_config());
    service
        .ingest_texts(&["Rust has no garbage collector.".to_string()], "notes.txt")
        .await
        .unwrap();

    let llm = Arc::new(MockLlm::new("unused"));
    let engine = RagEngine::new(embedder, store, llm.clone(), &RetrievalConfig::default());
    let response = engine
        .answer_question("Does Rust have a GC?", Some("notes.txt"), None)
        .await
        .unwrap();

    assert_eq!(response.citations.len(), 1);
    assert_eq!(response.citations[0]["source"], "notes.txt");
    let calls = llm.answer_calls.lock().unwrap();
    assert_eq!(
        calls[0].1,
        "Source (notes.txt): Rust has no garbage collector."
    );
}

#[tokio::test]
async fn test_background_ingestion_completes() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(RecordingStore::new());
    let service = Arc::new(IngestionService::new(
        embedder,
        store.clone(),
        paragraph_config(),
    ));

    let task = service.spawn(
        vec!["Paragraph one.\n\nParagraph two.".to_string()],
        "doc1".to_string(),
    );
    assert!(!task.id().is_empty());

    match task.wait().await {
        IngestionStatus::Completed(report) => assert_eq!(report.chunks, 1),
        other => panic!("unexpected status: {:?}", other),
    }
    assert_eq!(store.inner.count().unwrap(), 1);
}

#[tokio::test]
async fn test_background_ingestion_failure_is_reported() {
    let mut embedder = MockEmbedder::new();
    embedder.drop_last = true;
    let store = Arc::new(RecordingStore::new());
    let service = Arc::new(IngestionService::new(
        Arc::new(embedder),
        store,
        paragraph_config(),
    ));

    let task = service.spawn(vec!["Some text.".to_string()], "doc1".to_string());
    match task.wait().await {
        IngestionStatus::Failed { error } => assert!(error.contains("Count mismatch")),
        other => panic!("unexpected status: {:?}", other),
    }
}
