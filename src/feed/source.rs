use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use feed_rs::parser;
use reqwest::Client;

use crate::error::Result;
use crate::models::{FeedItem, Source};

/// Produces the current batch of items for one configured source. Stateless
/// between calls; one adapter instance serves every source descriptor.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<FeedItem>>;
}

pub struct RssAdapter {
    client: Client,
}

impl RssAdapter {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("newswire/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for RssAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch(&self, source: &Source) -> Result<Vec<FeedItem>> {
        let response = self.client.get(&source.feed_url).send().await?;

        if !response.status().is_success() {
            return Err(
                anyhow::anyhow!("failed to fetch feed: HTTP {}", response.status()).into(),
            );
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;

        let items: Vec<FeedItem> = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                // An entry without a link has no dedup key and is useless
                // downstream.
                let link = entry.links.first().map(|l| l.href.clone())?;

                // feed-rs hands timestamps back already normalized to UTC;
                // entries without one get the fetch time.
                let published = entry
                    .published
                    .or(entry.updated)
                    .unwrap_or_else(Utc::now);

                let summary = entry
                    .summary
                    .map(|s| html2text::from_read(s.content.as_bytes(), 80).unwrap_or(s.content))
                    .unwrap_or_default();

                Some(FeedItem {
                    title: entry
                        .title
                        .map(|t| t.content)
                        .unwrap_or_else(|| "Untitled".to_string()),
                    link,
                    categories: entry.categories.into_iter().map(|c| c.term).collect(),
                    published,
                    summary,
                })
            })
            .collect();

        Ok(items)
    }
}
