//! Local file loader
//!
//! Dispatches on extension. Inputs that cannot be ingested are reported as a
//! structured outcome rather than an error.

use super::pdf::load_pdf;
use crate::config::PdfConfig;
use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Extensions `load_file` understands
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Result of loading one file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { source: String, text: String },
    Unsupported { reason: String },
}

impl LoadOutcome {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }
}

/// Load a `.pdf` or `.txt` file; the source name is the file name
pub fn load_file(path: &Path, config: &PdfConfig) -> Result<LoadOutcome> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path)?;
            load_pdf(&bytes, config)?
        }
        "txt" => {
            let bytes = std::fs::read(path)?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        _ => {
            let supported: Vec<String> =
                SUPPORTED_EXTENSIONS.iter().map(|e| format!(".{}", e)).collect();
            return Ok(LoadOutcome::unsupported(format!(
                "Unsupported file type for {}. Use {}",
                source,
                supported.join(" or ")
            )));
        }
    };

    if text.trim().is_empty() {
        return Ok(LoadOutcome::unsupported(format!(
            "No text could be extracted from {}",
            source
        )));
    }

    info!("Loaded {} ({} characters)", source, text.len());
    Ok(LoadOutcome::Loaded { source, text })
}
