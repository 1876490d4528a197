use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Article, NewArticle, Source};

use super::schema::SCHEMA;

/// The single durable store shared by the fetch and notify loops. All
/// cross-loop coordination is pushed into its idempotent statements; no
/// in-process locking of article state exists anywhere else.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            // SQLite leaves foreign keys off by default; the schema relies on
            // ON DELETE CASCADE from sources to articles.
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Source operations

    pub async fn all_sources(&self) -> Result<Vec<Source>> {
        let sources = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, feed_url, created_at FROM sources ORDER BY id")?;
                let sources = stmt
                    .query_map([], |row| Ok(source_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sources)
            })
            .await?;
        Ok(sources)
    }

    pub async fn add_source(&self, name: &str, feed_url: &str) -> Result<i64> {
        let name = name.to_string();
        let feed_url = feed_url.to_string();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sources (name, feed_url) VALUES (?1, ?2)",
                    params![name, feed_url],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    #[allow(dead_code)]
    pub async fn delete_source(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM sources WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Article operations

    /// Inserts the article unless its link is already known. A duplicate link
    /// is a silent no-op, never an error and never an update, which makes the
    /// fetch loop safely re-entrant across overlapping ticks.
    pub async fn insert_article_if_absent(&self, article: NewArticle) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO articles (source_id, title, link, summary, published_at)
                       VALUES (?1, ?2, ?3, ?4, ?5)
                       ON CONFLICT(link) DO NOTHING"#,
                    params![
                        article.source_id,
                        article.title,
                        article.link,
                        article.summary,
                        article.published_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Not-yet-posted articles published at or after `since`, newest first.
    /// Ties on published_at resolve by id descending so selection is
    /// deterministic.
    pub async fn all_not_posted(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, source_id, title, link, summary, published_at, created_at, posted_at
                       FROM articles
                       WHERE posted_at IS NULL AND published_at >= ?1
                       ORDER BY published_at DESC, id DESC
                       LIMIT ?2"#,
                )?;
                let articles = stmt
                    .query_map(params![since.to_rfc3339(), limit], |row| {
                        Ok(article_from_row(row))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Sets posted_at once. A repeat call finds posted_at already set and
    /// updates nothing, so the timestamp never moves.
    pub async fn mark_posted(&self, id: i64, posted_at: DateTime<Utc>) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET posted_at = ?1 WHERE id = ?2 AND posted_at IS NULL",
                    params![posted_at.to_rfc3339(), id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn source_from_row(row: &Row) -> Source {
    Source {
        id: row.get(0).unwrap(),
        name: row.get(1).unwrap(),
        feed_url: row.get(2).unwrap(),
        created_at: row
            .get::<_, String>(3)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

fn article_from_row(row: &Row) -> Article {
    Article {
        id: row.get(0).unwrap(),
        source_id: row.get(1).unwrap(),
        title: row.get(2).unwrap(),
        link: row.get(3).unwrap(),
        summary: row.get(4).unwrap(),
        published_at: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        created_at: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        posted_at: row
            .get::<_, Option<String>>(7)
            .unwrap()
            .and_then(|s| parse_datetime(&s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_repository() -> (Repository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let repo = Repository::new(db_path.to_str().unwrap()).await.unwrap();
        (repo, dir)
    }

    fn article(source_id: i64, link: &str, published_at: DateTime<Utc>) -> NewArticle {
        NewArticle {
            source_id,
            title: format!("Article at {link}"),
            link: link.to_string(),
            summary: String::new(),
            published_at,
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent_on_link() {
        let (repo, _dir) = test_repository().await;
        let source_id = repo.add_source("feed", "https://example.com/rss").await.unwrap();

        let now = Utc::now();
        repo.insert_article_if_absent(article(source_id, "https://example.com/a", now))
            .await
            .unwrap();
        repo.insert_article_if_absent(article(source_id, "https://example.com/a", now))
            .await
            .unwrap();

        let eligible = repo.all_not_posted(now - Duration::hours(1), 10).await.unwrap();
        assert_eq!(eligible.len(), 1);
    }

    #[tokio::test]
    async fn eligibility_respects_lookup_window() {
        let (repo, _dir) = test_repository().await;
        let source_id = repo.add_source("feed", "https://example.com/rss").await.unwrap();

        let now = Utc::now();
        repo.insert_article_if_absent(article(source_id, "https://example.com/old", now - Duration::hours(48)))
            .await
            .unwrap();
        repo.insert_article_if_absent(article(source_id, "https://example.com/new", now))
            .await
            .unwrap();

        let eligible = repo.all_not_posted(now - Duration::hours(24), 10).await.unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].link, "https://example.com/new");
    }

    #[tokio::test]
    async fn mark_posted_removes_from_eligible_permanently() {
        let (repo, _dir) = test_repository().await;
        let source_id = repo.add_source("feed", "https://example.com/rss").await.unwrap();

        let now = Utc::now();
        repo.insert_article_if_absent(article(source_id, "https://example.com/a", now))
            .await
            .unwrap();

        let eligible = repo.all_not_posted(now - Duration::hours(1), 10).await.unwrap();
        let id = eligible[0].id;

        repo.mark_posted(id, Utc::now()).await.unwrap();
        // second call is a harmless no-op
        repo.mark_posted(id, Utc::now()).await.unwrap();

        let eligible = repo.all_not_posted(now - Duration::hours(1), 10).await.unwrap();
        assert!(eligible.is_empty());
    }

    #[tokio::test]
    async fn selection_orders_newest_first_with_id_tiebreak() {
        let (repo, _dir) = test_repository().await;
        let source_id = repo.add_source("feed", "https://example.com/rss").await.unwrap();

        let now = Utc::now();
        repo.insert_article_if_absent(article(source_id, "https://example.com/older", now - Duration::hours(2)))
            .await
            .unwrap();
        repo.insert_article_if_absent(article(source_id, "https://example.com/tie-first", now))
            .await
            .unwrap();
        repo.insert_article_if_absent(article(source_id, "https://example.com/tie-second", now))
            .await
            .unwrap();

        let top = repo.all_not_posted(now - Duration::hours(24), 1).await.unwrap();
        assert_eq!(top.len(), 1);
        // exact published_at tie resolves to the later id
        assert_eq!(top[0].link, "https://example.com/tie-second");
    }

    #[tokio::test]
    async fn deleting_a_source_cascades_to_its_articles() {
        let (repo, _dir) = test_repository().await;
        let source_id = repo.add_source("feed", "https://example.com/rss").await.unwrap();

        let now = Utc::now();
        repo.insert_article_if_absent(article(source_id, "https://example.com/a", now))
            .await
            .unwrap();

        repo.delete_source(source_id).await.unwrap();

        let eligible = repo.all_not_posted(now - Duration::hours(1), 10).await.unwrap();
        assert!(eligible.is_empty());
        assert!(repo.all_sources().await.unwrap().is_empty());
    }
}
