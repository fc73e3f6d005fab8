//! Query command

use super::Services;
use crate::app::{OutputFormat, QueryArgs};
use crate::output;
use anyhow::Result;
use docrag_core::{Config, DocRagError, RagEngine};

pub async fn run(args: QueryArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let message = args.message.join(" ");
    if message.trim().is_empty() {
        return Err(DocRagError::InvalidInput("Question must not be empty".to_string()).into());
    }

    let services = Services::from_config(config)?;
    let engine = RagEngine::new(
        services.embedder,
        services.store,
        services.llm,
        &config.retrieval,
    );

    let response = engine
        .answer_question(&message, args.source.as_deref(), args.strategy)
        .await?;

    print!("{}", output::format_rag_response(&response, format));
    Ok(())
}
