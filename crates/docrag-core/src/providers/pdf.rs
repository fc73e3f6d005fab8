//! PDF loader: per-page routed extraction

use crate::config::PdfConfig;
use crate::error::{DocRagError, Result};
use crate::pdf::{parse_pdf_layouts, PageAnalysis, PageLayout, PdfPageRouter};
use tracing::{info, warn};

/// Loads PDF bytes into page-delimited text
pub struct PdfLoader {
    router: PdfPageRouter,
}

impl PdfLoader {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            router: PdfPageRouter::new(config),
        }
    }

    /// Routing decision for every page, without extracting text
    pub fn analyze(&self, bytes: &[u8]) -> Result<Vec<PageAnalysis>> {
        let pages = parse_pdf_layouts(bytes)?;
        Ok(pages.iter().map(|page| self.router.analyze(page)).collect())
    }

    /// Extract every page with its routed strategy.
    ///
    /// Falls back to whole-document extraction when the content streams
    /// yield no words (for example fonts without a usable encoding).
    pub fn load(&self, bytes: &[u8]) -> Result<String> {
        match parse_pdf_layouts(bytes) {
            Ok(pages) if pages.iter().any(|p| !p.words.is_empty()) => {
                info!("Processing PDF ({} pages)", pages.len());
                Ok(self.render(&pages))
            }
            Ok(_) => {
                warn!("No positioned text found, using plain extraction");
                fallback_extract(bytes)
            }
            Err(e) => {
                warn!("Layout parsing failed ({}), using plain extraction", e);
                fallback_extract(bytes)
            }
        }
    }

    fn render(&self, pages: &[PageLayout]) -> String {
        let texts: Vec<String> = pages.iter().map(|page| self.router.parse(page)).collect();
        join_pages(&texts)
    }
}

/// Convenience wrapper around [`PdfLoader::load`]
pub fn load_pdf(bytes: &[u8], config: &PdfConfig) -> Result<String> {
    PdfLoader::new(config).load(bytes)
}

/// `--- Page N ---` headers, pages separated by a blank line
pub fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, text)| format!("--- Page {} ---\n{}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn fallback_extract(bytes: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| DocRagError::Pdf(format!("Failed to extract text from PDF: {}", e)))?;

    // pdf-extract separates pages with form feeds
    let pages: Vec<String> = text
        .split('\u{c}')
        .map(|page| {
            page.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    Ok(join_pages(&pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_pages() {
        let pages = vec!["first".to_string(), "second".to_string()];
        assert_eq!(
            join_pages(&pages),
            "--- Page 1 ---\nfirst\n\n--- Page 2 ---\nsecond"
        );
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn test_invalid_pdf_errors() {
        let result = load_pdf(b"definitely not a pdf", &PdfConfig::default());
        assert!(result.is_err());
    }
}
