//! PDF page analysis
//!
//! Pages are parsed into positioned words and rulings, then routed one by one
//! to prose extraction or to table reconstruction.

mod fonts;
mod layout;
mod parser;
mod router;
mod strategies;
mod tables;

pub use fonts::decode_pdf_string;
pub use layout::{extract_text, BBox, PageLayout, Ruling, Word};
pub use parser::parse_pdf_layouts;
pub use router::{route, PageAnalysis, PdfPageRouter};
pub use strategies::{PageStrategy, PageStrategyKind, TableStrategy, TextStrategy};
pub use tables::{find_tables, table_to_markdown, Table};
