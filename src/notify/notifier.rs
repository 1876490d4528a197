use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::content::ContentExtractor;
use crate::db::Repository;
use crate::error::Result;
use crate::models::Article;
use crate::notify::markup;
use crate::notify::telegram::Publisher;
use crate::summary::Summarizer;

/// The notify loop: on a fixed interval, picks the newest eligible article,
/// summarizes it, publishes it, and marks it posted.
pub struct Notifier {
    repository: Arc<Repository>,
    extractor: ContentExtractor,
    summarizer: Box<dyn Summarizer>,
    publisher: Box<dyn Publisher>,
    notify_interval: Duration,
    lookup_window: chrono::Duration,
}

impl Notifier {
    pub fn new(
        repository: Arc<Repository>,
        extractor: ContentExtractor,
        summarizer: Box<dyn Summarizer>,
        publisher: Box<dyn Publisher>,
        notify_interval: Duration,
        lookup_window: chrono::Duration,
    ) -> Self {
        Self {
            repository,
            extractor,
            summarizer,
            publisher,
            notify_interval,
            lookup_window,
        }
    }

    /// Runs until the shutdown signal fires; cancellation is checked at tick
    /// boundaries, never mid-cycle.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.notify_interval);
        tracing::info!(
            "notifier started, posting every {:?} within a {}h lookup window",
            self.notify_interval,
            self.lookup_window.num_hours()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.select_and_send_once().await {
                        tracing::error!("notify cycle failed: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("notifier stopped");
                    return;
                }
            }
        }
    }

    /// One full cycle. A failure anywhere before mark-posted leaves the
    /// article eligible for the next tick. If publish succeeds and
    /// mark-posted fails, the article may be delivered again later; that
    /// duplicate is accepted rather than risking a lost post.
    pub async fn select_and_send_once(&self) -> Result<()> {
        let since = Utc::now() - self.lookup_window;
        let candidates = self.repository.all_not_posted(since, 1).await?;

        let Some(article) = candidates.into_iter().next() else {
            tracing::debug!("no eligible articles to post");
            return Ok(());
        };

        tracing::info!("selected article for posting: {}", article.title);

        let text = self.extractor.extract(&article).await?;
        let summary = self.summarizer.summarize(&text).await?;

        self.publisher.send(&format_message(&article, &summary)).await?;

        self.repository.mark_posted(article.id, Utc::now()).await?;
        tracing::info!("article posted: {}", article.link);

        Ok(())
    }
}

/// Bold escaped title, blank line, summary, blank line, link. Every field is
/// escaped individually so feed-supplied text cannot break the markup.
fn format_message(article: &Article, summary: &str) -> String {
    format!(
        "*{}*\n\n{}\n\n{}",
        markup::escape_markdown(&article.title),
        markup::escape_markdown(summary),
        markup::escape_markdown(&article.link),
    )
}
