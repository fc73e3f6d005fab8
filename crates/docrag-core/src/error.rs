//! Error types for docrag

use thiserror::Error;

/// Result type alias using DocRagError
pub type Result<T> = std::result::Result<T, DocRagError>;

/// Error type alias for convenience
pub type Error = DocRagError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const UNSUPPORTED_INPUT: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for docrag
#[derive(Debug, Error)]
pub enum DocRagError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Count mismatch: {chunks} chunks but {vectors} vectors")]
    CountMismatch { chunks: usize, vectors: usize },

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl From<lopdf::Error> for DocRagError {
    fn from(e: lopdf::Error) -> Self {
        Self::Pdf(e.to_string())
    }
}

impl DocRagError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedInput(_) => exit_codes::UNSUPPORTED_INPUT,
            Self::Configuration(_) | Self::InvalidInput(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
