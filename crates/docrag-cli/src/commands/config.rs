//! Config command

use crate::app::{ConfigAction, ConfigArgs, OutputFormat};
use anyhow::Result;
use docrag_core::Config;
use std::path::Path;

pub fn run(args: ConfigArgs, config: &Config, path: &Path, format: OutputFormat) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let mut shown = config.clone();
            if shown.llm_service.api_key.is_some() {
                shown.llm_service.api_key = Some("********".to_string());
            }
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
                OutputFormat::Cli => print!("{}", serde_yaml::to_string(&shown)?),
            }
        }
        ConfigAction::Path => match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "path": path, "exists": path.exists() })
            ),
            OutputFormat::Cli => println!("{}", path.display()),
        },
    }
    Ok(())
}
