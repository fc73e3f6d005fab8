//! docrag CLI
//!
//! Ingest PDFs, text files and web pages, then ask grounded questions.

use anyhow::Result;
use clap::Parser;
use docrag_core::error::exit_codes;
use docrag_core::{Config, DocRagError};

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands, OutputFormat};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let format = cli.format;
    if let Err(e) = run(cli).await {
        let code = e
            .downcast_ref::<DocRagError>()
            .map(DocRagError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        match format {
            OutputFormat::Json => print!("{}", output::format_error(&e, code)),
            OutputFormat::Cli => eprintln!("Error: {:#}", e),
        }
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from(&config_path)?;

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, &config, cli.format).await,
        Commands::Query(args) => commands::query::run(args, &config, cli.format).await,
        Commands::Chunk(args) => commands::chunk::run(args, &config, cli.format).await,
        Commands::Pages(args) => commands::pages::run(args, &config, cli.format),
        Commands::Config(args) => commands::config::run(args, &config, &config_path, cli.format),
        Commands::Reset => commands::reset::run(&config, cli.format),
    }
}
