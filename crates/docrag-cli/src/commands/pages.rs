//! PDF page routing inspection

use crate::app::{OutputFormat, PagesArgs};
use crate::output;
use anyhow::{Context, Result};
use docrag_core::{Config, PdfLoader};

pub fn run(args: PagesArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let bytes = std::fs::read(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let pages = PdfLoader::new(&config.pdf).analyze(&bytes)?;

    print!("{}", output::format_page_analyses(&pages, format));
    Ok(())
}
