//! Chunk preview command

use crate::app::{ChunkArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use docrag_core::{
    create_chunker, load_file, Config, DocRagError, Embedder, HttpEmbedder, LoadOutcome,
    StrategyKind,
};
use std::sync::Arc;

/// Chunk a local file without storing anything.
///
/// Only the semantic strategy talks to the embedding service.
pub async fn run(args: ChunkArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let text = match load_file(&args.path, &config.pdf)? {
        LoadOutcome::Loaded { text, .. } => text,
        LoadOutcome::Unsupported { reason } => {
            return Err(DocRagError::UnsupportedInput(reason).into())
        }
    };

    let strategy = args
        .strategy
        .unwrap_or_else(|| config.chunking.strategy.clone());
    let embedder: Option<Arc<dyn Embedder>> = match StrategyKind::parse(&strategy) {
        Some(StrategyKind::Semantic) => Some(Arc::new(HttpEmbedder::from_config(
            config.llm_service.clone(),
        )?)),
        _ => None,
    };

    let token_safe = config.chunking.token_safe && !args.no_token_safe;
    let engine = create_chunker(&strategy, embedder, token_safe, &config.chunking)?;
    let chunks = engine.chunk(&text).await?;

    print!(
        "{}",
        output::format_chunks(&chunks, engine.strategy(), engine.is_token_safe(), format)
    );
    Ok(())
}
