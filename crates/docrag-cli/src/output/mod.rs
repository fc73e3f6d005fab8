//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use docrag_core::{IngestionStatus, PageAnalysis, RagResponse, StrategyKind};

/// Format an answer with its citations
pub fn format_rag_response(response: &RagResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_rag_response(response),
        OutputFormat::Cli => terminal::format_rag_response(response),
    }
}

/// Format the final state of an ingestion
pub fn format_ingest_status(status: &IngestionStatus, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(status),
        OutputFormat::Cli => terminal::format_ingest_status(status),
    }
}

/// Format a chunking preview
pub fn format_chunks(
    chunks: &[String],
    strategy: StrategyKind,
    token_safe: bool,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => json::format_chunks(chunks, strategy, token_safe),
        OutputFormat::Cli => terminal::format_chunks(chunks, strategy, token_safe),
    }
}

/// Format per-page routing decisions
pub fn format_page_analyses(pages: &[PageAnalysis], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(pages),
        OutputFormat::Cli => terminal::format_page_analyses(pages),
    }
}

/// Structured error for JSON output
pub fn format_error(error: &anyhow::Error, code: i32) -> String {
    json::format_error(error, code)
}
