//! Document loaders
//!
//! Turn raw inputs into text ready for chunking:
//! - PDF bytes, routed page by page between prose and table extraction
//! - Plain text files
//! - Web pages, with navigation and scripts stripped

pub mod file;
pub mod pdf;
pub mod url;

pub use file::{load_file, LoadOutcome, SUPPORTED_EXTENSIONS};
pub use pdf::{join_pages, load_pdf, PdfLoader};
pub use url::{html_to_text, load_url, UrlLoader};
