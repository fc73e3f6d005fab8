//! Terminal output formatter

use docrag_core::{IngestionStatus, PageAnalysis, RagResponse, StrategyKind};

pub fn format_rag_response(response: &RagResponse) -> String {
    let mut output = format!("{}\n", response.answer.trim());

    if response.generated_queries.len() > 1 {
        output.push_str("\nQueries:\n");
        for query in &response.generated_queries {
            output.push_str(&format!("  - {}\n", query));
        }
    }

    if !response.citations.is_empty() {
        output.push_str("\nSources:\n");
        for (i, citation) in response.citations.iter().enumerate() {
            let source = citation
                .get("source")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            match citation.get("chunk_index").and_then(|v| v.as_u64()) {
                Some(index) => output.push_str(&format!("  [{}] {} #{}\n", i + 1, source, index)),
                None => output.push_str(&format!("  [{}] {}\n", i + 1, source)),
            }
        }
    }

    output
}

pub fn format_ingest_status(status: &IngestionStatus) -> String {
    match status {
        IngestionStatus::Completed(report) => format!(
            "Ingested {} chunks from {} ({} text{}, {:.2}s)\n",
            report.chunks,
            report.source,
            report.texts,
            if report.texts == 1 { "" } else { "s" },
            report.duration.as_secs_f64()
        ),
        other => format!("Ingestion {}\n", other),
    }
}

pub fn format_chunks(chunks: &[String], strategy: StrategyKind, token_safe: bool) -> String {
    let mut output = format!(
        "{} chunks ({}{})\n",
        chunks.len(),
        strategy,
        if token_safe { ", token-safe" } else { "" }
    );

    for (i, chunk) in chunks.iter().enumerate() {
        output.push_str(&format!("\n--- Chunk {} ({} chars) ---\n", i + 1, chunk.chars().count()));
        output.push_str(chunk);
        output.push('\n');
    }

    output
}

pub fn format_page_analyses(pages: &[PageAnalysis]) -> String {
    let mut output = format!("{:>5}  {:<6}  {:>8}  {:>6}\n", "Page", "Route", "Coverage", "Tables");
    for page in pages {
        output.push_str(&format!(
            "{:>5}  {:<6}  {:>7.1}%  {:>6}\n",
            page.page_number,
            page.strategy.as_str(),
            page.coverage_ratio * 100.0,
            page.significant_table_count
        ));
    }
    output
}
