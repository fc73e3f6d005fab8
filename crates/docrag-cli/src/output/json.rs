//! JSON output formatter

use docrag_core::{RagResponse, StrategyKind};
use serde::Serialize;

pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

pub fn format_rag_response(response: &RagResponse) -> String {
    to_pretty(response)
}

pub fn format_chunks(chunks: &[String], strategy: StrategyKind, token_safe: bool) -> String {
    to_pretty(&serde_json::json!({
        "strategy": strategy,
        "token_safe": token_safe,
        "count": chunks.len(),
        "chunks": chunks,
    }))
}

pub fn format_error(error: &anyhow::Error, code: i32) -> String {
    to_pretty(&serde_json::json!({
        "error": format!("{:#}", error),
        "exit_code": code,
    }))
}
