//! Per-page routing between prose and table extraction

use super::layout::PageLayout;
use super::strategies::{PageStrategy, PageStrategyKind, TableStrategy, TextStrategy};
use super::tables::find_tables;
use crate::config::PdfConfig;
use serde::Serialize;
use tracing::debug;

/// Table statistics behind a routing decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAnalysis {
    pub page_number: usize,
    /// Area of tables with at least two rows over page area
    pub coverage_ratio: f64,
    pub significant_table_count: usize,
    pub strategy: PageStrategyKind,
}

/// Decision rule: Table when tables cover more than the threshold or there
/// are enough of them
pub fn route(
    coverage_ratio: f64,
    significant_table_count: usize,
    config: &PdfConfig,
) -> PageStrategyKind {
    if coverage_ratio > config.coverage_threshold
        || significant_table_count >= config.min_table_count
    {
        PageStrategyKind::Table
    } else {
        PageStrategyKind::Text
    }
}

pub struct PdfPageRouter {
    config: PdfConfig,
    text: TextStrategy,
    table: TableStrategy,
}

impl PdfPageRouter {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            config: config.clone(),
            text: TextStrategy::new(config),
            table: TableStrategy::new(config),
        }
    }

    /// Measure table coverage and decide.
    ///
    /// With table parsing disabled no detection runs and the page is Text.
    pub fn analyze(&self, page: &PageLayout) -> PageAnalysis {
        if !self.config.enable_table_parsing {
            return PageAnalysis {
                page_number: page.page_number,
                coverage_ratio: 0.0,
                significant_table_count: 0,
                strategy: PageStrategyKind::Text,
            };
        }

        let mut table_area = 0.0;
        let mut significant = 0;
        for table in find_tables(page, &self.config) {
            // Tiny single-row boxes are usually headers or page numbers
            if table.row_count() < 2 {
                continue;
            }
            table_area += table.bbox.area();
            significant += 1;
        }

        let page_area = page.area();
        let coverage_ratio = if page_area > 0.0 {
            table_area / page_area
        } else {
            0.0
        };
        let strategy = route(coverage_ratio, significant, &self.config);

        debug!(
            "Page {}: coverage={:.2}, tables={}, strategy={}",
            page.page_number, coverage_ratio, significant, strategy
        );

        PageAnalysis {
            page_number: page.page_number,
            coverage_ratio,
            significant_table_count: significant,
            strategy,
        }
    }

    pub fn select(&self, page: &PageLayout) -> PageStrategyKind {
        self.analyze(page).strategy
    }

    pub fn strategy(&self, kind: PageStrategyKind) -> &dyn PageStrategy {
        match kind {
            PageStrategyKind::Text => &self.text,
            PageStrategyKind::Table => &self.table,
        }
    }

    /// Route the page and extract its text
    pub fn parse(&self, page: &PageLayout) -> String {
        self.strategy(self.select(page)).parse(page)
    }
}
