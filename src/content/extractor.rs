use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::Article;

/// Turns an article into plain text for the summarizer: the stored summary
/// when present, otherwise the readable text of the linked page.
pub struct ContentExtractor {
    client: Client,
}

impl ContentExtractor {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("newswire/1.0")
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// A fetch or extraction failure here is fatal to the current notify
    /// cycle; the article stays eligible and is retried on a later tick.
    pub async fn extract(&self, article: &Article) -> Result<String> {
        let text = if !article.summary.is_empty() {
            article.summary.clone()
        } else {
            self.fetch_readable(&article.link).await?
        };

        Ok(collapse_newlines(&text))
    }

    async fn fetch_readable(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ContentExtraction(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let html = response.text().await?;

        html2text::from_read(html.as_bytes(), 80)
            .map_err(|e| AppError::ContentExtraction(format!("failed to parse {url}: {e}")))
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapses runs of 3 or more newlines to a single newline. Double newlines
/// (paragraph breaks) are left alone.
pub fn collapse_newlines(text: &str) -> String {
    static REDUNDANT_NEWLINES: OnceLock<Regex> = OnceLock::new();
    let re = REDUNDANT_NEWLINES.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"));
    re.replace_all(text, "\n").into_owned()
}
