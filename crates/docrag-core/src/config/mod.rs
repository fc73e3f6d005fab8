//! Configuration management
//!
//! One [`Config`] is built at startup (YAML file, then environment defaults
//! for service credentials) and handed to each component when it is
//! constructed.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding and chat service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Chunking engine settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// PDF page routing settings
    #[serde(default)]
    pub pdf: PdfConfig,

    /// Query-time settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Ingestion pipeline settings
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Local vector store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the chat completions service
    pub url: String,

    /// Model name for chat completions (answers and query translation)
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions, shared by the embedder and the vector store
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for grounded answers
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DOCRAG_LLM_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("DOCRAG_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            api_key: std::env::var("DOCRAG_LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok(),
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("DOCRAG_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("DOCRAG_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "text-embedding-3-small".to_string())
}

fn default_embedding_dimensions() -> usize {
    std::env::var("DOCRAG_EMBEDDING_DIMS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(512)
}

fn default_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.3
}

/// Chunking engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Strategy key: recursive, paragraph or semantic
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap carried between chunks, in characters
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,

    /// Wrap the strategy in the token-safety decorator
    #[serde(default = "default_true")]
    pub token_safe: bool,

    /// Hard token ceiling per chunk (embedding model input limit)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Percentile of sentence distances above which the semantic strategy splits
    #[serde(default = "default_breakpoint_percentile")]
    pub breakpoint_percentile: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            chunk_size: default_chunk_size(),
            overlap_size: default_overlap_size(),
            token_safe: true,
            max_tokens: default_max_tokens(),
            breakpoint_percentile: default_breakpoint_percentile(),
        }
    }
}

fn default_strategy() -> String {
    "recursive".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_overlap_size() -> usize {
    200
}

fn default_max_tokens() -> usize {
    8000
}

fn default_breakpoint_percentile() -> f64 {
    95.0
}

fn default_true() -> bool {
    true
}

/// PDF page routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// When false every page goes through the text strategy
    #[serde(default = "default_true")]
    pub enable_table_parsing: bool,

    /// Table area / page area above which a page is routed to the table strategy
    #[serde(default = "default_coverage_threshold")]
    pub coverage_threshold: f64,

    /// Number of significant tables at which a page is routed to the table strategy
    #[serde(default = "default_min_table_count")]
    pub min_table_count: usize,

    /// Distance within which ruling lines are snapped and joined
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance: f64,

    /// Horizontal gap (points) that still counts as the same word run
    #[serde(default = "default_x_tolerance")]
    pub x_tolerance: f64,

    /// Vertical distance (points) within which words share a line
    #[serde(default = "default_y_tolerance")]
    pub y_tolerance: f64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            enable_table_parsing: true,
            coverage_threshold: default_coverage_threshold(),
            min_table_count: default_min_table_count(),
            snap_tolerance: default_snap_tolerance(),
            x_tolerance: default_x_tolerance(),
            y_tolerance: default_y_tolerance(),
        }
    }
}

fn default_coverage_threshold() -> f64 {
    0.15
}

fn default_min_table_count() -> usize {
    2
}

fn default_snap_tolerance() -> f64 {
    3.0
}

fn default_x_tolerance() -> f64 {
    2.0
}

fn default_y_tolerance() -> f64 {
    3.0
}

/// Query-time configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks requested from the vector store per search query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    8
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Texts sent per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    32
}

/// Local SQLite vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Database file; defaults to the user data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the database path (DOCRAG_DB wins over the config file)
    pub fn resolved_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var("DOCRAG_DB") {
            return PathBuf::from(path);
        }
        self.path
            .clone()
            .unwrap_or_else(crate::db::SqliteVectorStore::default_path)
    }
}

impl Config {
    /// Load config from a specific file, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}
