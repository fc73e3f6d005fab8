//! Ingest commands

use super::Services;
use crate::app::{IngestAction, IngestArgs, OutputFormat};
use crate::output;
use crate::progress::TaskProgress;
use anyhow::Result;
use docrag_core::{
    load_file, Config, DocRagError, IngestionService, IngestionStatus, LoadOutcome, UrlLoader,
};
use std::sync::Arc;

pub async fn run(args: IngestArgs, config: &Config, format: OutputFormat) -> Result<()> {
    match args.action {
        IngestAction::File { path } => {
            let (text, source) = match load_file(&path, &config.pdf)? {
                LoadOutcome::Loaded { text, source } => (text, source),
                LoadOutcome::Unsupported { reason } => {
                    return Err(DocRagError::UnsupportedInput(reason).into())
                }
            };
            submit(config, vec![text], source, format).await
        }
        IngestAction::Url { url } => {
            let text = UrlLoader::new()?.load(&url).await;
            if text.trim().is_empty() {
                return Err(DocRagError::UnsupportedInput(format!(
                    "No text could be extracted from {}",
                    url
                ))
                .into());
            }
            submit(config, vec![text], url, format).await
        }
        IngestAction::Text { texts, source } => {
            let service = build_service(config)?;
            let report = service.ingest_texts(&texts, &source).await?;
            print!(
                "{}",
                output::format_ingest_status(&IngestionStatus::Completed(report), format)
            );
            Ok(())
        }
    }
}

fn build_service(config: &Config) -> Result<IngestionService> {
    let services = Services::from_config(config)?;
    Ok(IngestionService::new(
        services.embedder,
        services.store,
        config.chunking.clone(),
    )
    .with_batch_size(config.ingestion.batch_size))
}

/// Submit as a background task and follow it until it settles
async fn submit(
    config: &Config,
    texts: Vec<String>,
    source: String,
    format: OutputFormat,
) -> Result<()> {
    let service = Arc::new(build_service(config)?);
    let task = service.spawn(texts, source);

    if format == OutputFormat::Cli {
        println!("Submitted ingestion task {}", task.id());
    }

    let status = TaskProgress::new(format == OutputFormat::Json)
        .follow(task)
        .await;
    print!("{}", output::format_ingest_status(&status, format));

    match status {
        IngestionStatus::Failed { error } => Err(anyhow::anyhow!(error)),
        _ => Ok(()),
    }
}
