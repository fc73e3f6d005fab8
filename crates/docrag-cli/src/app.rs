//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use docrag_core::TranslationStrategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docrag")]
#[command(
    author,
    version,
    about = "Ingest documents and ask grounded questions over them"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "DOCRAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a file, a web page or raw text
    Ingest(IngestArgs),

    /// Ask a question over ingested documents
    Query(QueryArgs),

    /// Preview how a file would be chunked
    Chunk(ChunkArgs),

    /// Show the routing decision for every page of a PDF
    Pages(PagesArgs),

    /// Show configuration
    Config(ConfigArgs),

    /// Drop all stored chunks for the configured embedding dimension
    Reset,
}

#[derive(Args)]
pub struct IngestArgs {
    #[command(subcommand)]
    pub action: IngestAction,
}

#[derive(Subcommand)]
pub enum IngestAction {
    /// Ingest a .pdf or .txt file
    File { path: PathBuf },
    /// Scrape and ingest a web page
    Url { url: String },
    /// Ingest literal texts
    Text {
        #[arg(required = true)]
        texts: Vec<String>,

        /// Source name stored with every chunk
        #[arg(long, default_value = docrag_core::index::DEFAULT_SOURCE)]
        source: String,
    },
}

#[derive(Args)]
pub struct QueryArgs {
    /// Question
    #[arg(required = true)]
    pub message: Vec<String>,

    /// Only retrieve chunks from this source
    #[arg(short, long)]
    pub source: Option<String>,

    /// Query translation strategy (multi_query, step_back, rag_fusion, hyde)
    #[arg(long)]
    pub strategy: Option<TranslationStrategy>,
}

#[derive(Args)]
pub struct ChunkArgs {
    /// .pdf or .txt file
    pub path: PathBuf,

    /// Chunking strategy (recursive, paragraph, semantic)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Skip the token limit
    #[arg(long)]
    pub no_token_safe: bool,
}

#[derive(Args)]
pub struct PagesArgs {
    /// PDF file
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
