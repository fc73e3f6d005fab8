//! Per-page text extraction strategies

use super::layout::PageLayout;
use super::tables::find_tables;
use crate::config::PdfConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which extraction a page gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStrategyKind {
    Text,
    Table,
}

impl PageStrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for PageStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns one page into text
pub trait PageStrategy: Send + Sync {
    fn parse(&self, page: &PageLayout) -> String;

    fn kind(&self) -> PageStrategyKind;
}

/// Layout-aware prose extraction, for running text and multi-column pages
#[derive(Debug, Clone)]
pub struct TextStrategy {
    y_tolerance: f64,
}

impl TextStrategy {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            y_tolerance: config.y_tolerance,
        }
    }
}

impl PageStrategy for TextStrategy {
    fn parse(&self, page: &PageLayout) -> String {
        page.extract_text_layout(self.y_tolerance)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn kind(&self) -> PageStrategyKind {
        PageStrategyKind::Text
    }
}

/// Prose around tables plus the tables themselves as delimited markdown
#[derive(Debug, Clone)]
pub struct TableStrategy {
    config: PdfConfig,
}

impl TableStrategy {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn band_text(&self, page: &PageLayout, top: f64, bottom: f64) -> String {
        let words = page.words_in_band(top, bottom);
        super::layout::extract_text(&words, self.config.x_tolerance, self.config.y_tolerance)
    }
}

impl PageStrategy for TableStrategy {
    fn parse(&self, page: &PageLayout) -> String {
        let tables = find_tables(page, &self.config);

        let mut segments = Vec::new();
        let mut last_bottom = 0.0;

        for table in &tables {
            if table.bbox.top > last_bottom {
                let text = self.band_text(page, last_bottom, table.bbox.top);
                if !text.is_empty() {
                    segments.push(text);
                }
            }

            if !table.rows.is_empty() {
                segments.push(format!(
                    "\n[TABLE_START]\n{}\n[TABLE_END]\n",
                    table.to_markdown()
                ));
            }

            last_bottom = table.bbox.bottom;
        }

        if last_bottom < page.height {
            let text = self.band_text(page, last_bottom, f64::INFINITY);
            if !text.is_empty() {
                segments.push(text);
            }
        }

        segments.join("\n\n")
    }

    fn kind(&self) -> PageStrategyKind {
        PageStrategyKind::Table
    }
}
