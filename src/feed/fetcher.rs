use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;

use crate::db::Repository;
use crate::error::Result;
use crate::feed::filter;
use crate::feed::source::SourceAdapter;
use crate::models::{NewArticle, Source};

/// The fetch loop: polls every configured source on a fixed interval and
/// persists surviving items exactly once per link.
pub struct Fetcher {
    repository: Arc<Repository>,
    adapter: Arc<dyn SourceAdapter>,
    fetch_interval: Duration,
    filter_keywords: Arc<Vec<String>>,
}

impl Fetcher {
    pub fn new(
        repository: Arc<Repository>,
        adapter: Arc<dyn SourceAdapter>,
        fetch_interval: Duration,
        filter_keywords: Vec<String>,
    ) -> Self {
        Self {
            repository,
            adapter,
            fetch_interval,
            filter_keywords: Arc::new(filter_keywords),
        }
    }

    /// Runs until the shutdown signal fires. The first tick is immediate;
    /// cancellation is checked at tick boundaries, so in-flight work for the
    /// current tick always drains.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.fetch_interval);
        tracing::info!("fetcher started, polling every {:?}", self.fetch_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.fetch_once().await {
                        tracing::error!("fetch cycle failed: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("fetcher stopped");
                    return;
                }
            }
        }
    }

    /// One full fetch cycle: one concurrent task per source, joined before
    /// the cycle is considered complete. Safe to call repeatedly and
    /// concurrently with itself; the store's insert-if-absent is the safety
    /// net for overlapping ticks.
    pub async fn fetch_once(&self) -> Result<()> {
        let sources = self.repository.all_sources().await?;

        let tasks: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let repository = self.repository.clone();
                let adapter = self.adapter.clone();
                let keywords = self.filter_keywords.clone();

                tokio::spawn(async move {
                    if let Err(e) =
                        fetch_source(adapter.as_ref(), &repository, &keywords, &source).await
                    {
                        tracing::warn!("failed to fetch source {}: {e}", source.name);
                    }
                })
            })
            .collect();

        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                // a panicking source task must not take the loop down
                tracing::error!("source task aborted: {e}");
            }
        }

        Ok(())
    }
}

async fn fetch_source(
    adapter: &dyn SourceAdapter,
    repository: &Repository,
    keywords: &[String],
    source: &Source,
) -> Result<()> {
    let items = adapter.fetch(source).await?;
    tracing::debug!("fetched {} items from {}", items.len(), source.name);

    for item in items {
        if filter::should_skip(&item, keywords) {
            tracing::debug!("skipping filtered item {}", item.link);
            continue;
        }

        let link = item.link.clone();
        let result = repository
            .insert_article_if_absent(NewArticle {
                source_id: source.id,
                title: item.title,
                link: item.link,
                summary: item.summary,
                published_at: item.published,
            })
            .await;

        // a store failure aborts this item only, not the source's batch
        if let Err(e) = result {
            tracing::warn!("failed to store article {link}: {e}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::models::FeedItem;

    struct StaticAdapter {
        items: Vec<FeedItem>,
    }

    #[async_trait]
    impl SourceAdapter for StaticAdapter {
        async fn fetch(&self, _source: &Source) -> Result<Vec<FeedItem>> {
            Ok(self.items.clone())
        }
    }

    struct FailingAdapter;

    #[async_trait]
    impl SourceAdapter for FailingAdapter {
        async fn fetch(&self, _source: &Source) -> Result<Vec<FeedItem>> {
            Err(anyhow::anyhow!("connection refused").into())
        }
    }

    async fn test_repository() -> (Arc<Repository>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let repo = Repository::new(db_path.to_str().unwrap()).await.unwrap();
        (Arc::new(repo), dir)
    }

    fn item(title: &str, link: &str, categories: &[&str]) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: link.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            published: Utc::now(),
            summary: String::new(),
        }
    }

    #[tokio::test]
    async fn fetch_once_with_no_sources_is_a_noop() {
        let (repo, _dir) = test_repository().await;
        let fetcher = Fetcher::new(
            repo.clone(),
            Arc::new(StaticAdapter { items: vec![] }),
            Duration::from_secs(60),
            vec![],
        );

        fetcher.fetch_once().await.unwrap();

        let eligible = repo
            .all_not_posted(Utc::now() - chrono::Duration::hours(1), 10)
            .await
            .unwrap();
        assert!(eligible.is_empty());
    }

    #[tokio::test]
    async fn filtered_items_are_not_persisted() {
        let (repo, _dir) = test_repository().await;
        repo.add_source("feed", "https://example.com/rss").await.unwrap();

        let adapter = StaticAdapter {
            items: vec![
                item("LeetCode Weekly Contest", "https://example.com/contest", &[]),
                item("Kernel 6.13 released", "https://example.com/kernel", &[]),
            ],
        };
        let fetcher = Fetcher::new(
            repo.clone(),
            Arc::new(adapter),
            Duration::from_secs(60),
            vec!["leetcode".to_string()],
        );

        fetcher.fetch_once().await.unwrap();

        let eligible = repo
            .all_not_posted(Utc::now() - chrono::Duration::hours(1), 10)
            .await
            .unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].link, "https://example.com/kernel");
    }

    #[tokio::test]
    async fn repeated_cycles_do_not_duplicate_articles() {
        let (repo, _dir) = test_repository().await;
        repo.add_source("feed", "https://example.com/rss").await.unwrap();

        let adapter = StaticAdapter {
            items: vec![item("Kernel 6.13 released", "https://example.com/kernel", &[])],
        };
        let fetcher = Fetcher::new(repo.clone(), Arc::new(adapter), Duration::from_secs(60), vec![]);

        fetcher.fetch_once().await.unwrap();
        fetcher.fetch_once().await.unwrap();

        let eligible = repo
            .all_not_posted(Utc::now() - chrono::Duration::hours(1), 10)
            .await
            .unwrap();
        assert_eq!(eligible.len(), 1);
    }

    #[tokio::test]
    async fn failing_source_does_not_fail_the_cycle() {
        let (repo, _dir) = test_repository().await;
        repo.add_source("feed", "https://example.com/rss").await.unwrap();

        let fetcher = Fetcher::new(
            repo.clone(),
            Arc::new(FailingAdapter),
            Duration::from_secs(60),
            vec![],
        );

        fetcher.fetch_once().await.unwrap();
    }

    #[tokio::test]
    async fn run_exits_on_shutdown_signal() {
        let (repo, _dir) = test_repository().await;
        let fetcher = Fetcher::new(
            repo,
            Arc::new(StaticAdapter { items: vec![] }),
            Duration::from_secs(3600),
            vec![],
        );

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), fetcher.run(rx))
            .await
            .expect("fetcher did not stop on shutdown");
    }
}
