use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured external feed to poll. Created by the provisioning path;
/// read-only to the fetch and notify loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
    pub created_at: DateTime<Utc>,
}

/// A single entry pulled from a feed. Transient: filtered and mapped into a
/// `NewArticle`, never persisted as-is.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub categories: Vec<String>,
    pub published: DateTime<Utc>,
    pub summary: String,
}

/// Write-side record for an article about to be persisted.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

/// A persisted, deduplicated article. `posted_at = None` means the article is
/// still eligible for posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}
