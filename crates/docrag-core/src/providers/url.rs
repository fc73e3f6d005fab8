//! URL loader: fetch a web page and keep its readable text

use crate::error::{DocRagError, Result};
use reqwest::Client;
use scraper::{ElementRef, Html};
use std::time::Duration;
use tracing::{debug, warn};

/// Elements whose text never counts as page content
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Browser-like agent; many sites reject unknown clients with 403
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct UrlLoader {
    client: Client,
}

impl UrlLoader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DocRagError::ExternalService(format!(
                "HTTP {} fetching {}",
                status.as_u16(),
                url
            )));
        }
        Ok(response.text().await?)
    }

    /// Cleaned page text, or an empty string when the page cannot be fetched
    pub async fn load(&self, url: &str) -> String {
        match self.fetch_html(url).await {
            Ok(html) => {
                let text = html_to_text(&html);
                debug!("Extracted {} characters from {}", text.len(), url);
                text
            }
            Err(e) => {
                warn!("Error scraping {}: {}", url, e);
                String::new()
            }
        }
    }
}

/// Fetch `url` with a fresh client; empty string on any failure
pub async fn load_url(url: &str) -> String {
    match UrlLoader::new() {
        Ok(loader) => loader.load(url).await,
        Err(e) => {
            warn!("Failed to create HTTP client: {}", e);
            String::new()
        }
    }
}

/// Visible text of an HTML document with boilerplate elements removed.
///
/// Lines are trimmed, runs of two spaces split phrases onto their own lines,
/// and empty lines are dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    raw.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if !STRIPPED_TAGS.contains(&el.value().name()) {
                collect_text(el, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}
