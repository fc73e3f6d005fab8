//! Chunk records as stored and retrieved

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrievable piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Similarity to the query, set on search results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl DocumentChunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            vector: None,
            metadata,
            score: None,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }

    pub fn chunk_index(&self) -> Option<u64> {
        self.metadata.get("chunk_index").and_then(Value::as_u64)
    }

    pub fn strategy(&self) -> Option<&str> {
        self.metadata.get("strategy").and_then(Value::as_str)
    }
}
