//! Reset command

use super::open_store;
use crate::app::OutputFormat;
use anyhow::Result;
use docrag_core::Config;

pub fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let removed = store.count()?;
    store.reset()?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "table": store.table_name(), "removed": removed })
        ),
        OutputFormat::Cli => println!("Removed {} chunks from {}", removed, store.table_name()),
    }
    Ok(())
}
