use std::collections::HashSet;
use std::sync::Arc;

mod config;
mod content;
mod db;
mod error;
mod feed;
mod models;
mod notify;
mod summary;

use config::Config;
use content::ContentExtractor;
use db::Repository;
use error::{AppError, Result};
use feed::fetcher::Fetcher;
use feed::source::RssAdapter;
use notify::notifier::Notifier;
use notify::telegram::TelegramPublisher;
use summary::{OpenAiSummarizer, Summarizer, TrimSummarizer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    let bot_token = config
        .telegram_bot_token
        .clone()
        .ok_or_else(|| AppError::Config("telegram_bot_token is required".to_string()))?;

    let repository = Arc::new(Repository::new(&config.db_path).await?);
    seed_sources(&repository, &config).await?;

    let summarizer: Box<dyn Summarizer> = match &config.openai_api_key {
        Some(key) => {
            tracing::info!("generative summarizer enabled (model {})", config.openai_model);
            Box::new(OpenAiSummarizer::new(
                key.clone(),
                config.openai_model.clone(),
                config.openai_prompt.clone(),
            ))
        }
        None => {
            tracing::info!("no OpenAI credential configured, using extractive summaries");
            Box::new(TrimSummarizer)
        }
    };

    let fetcher = Fetcher::new(
        repository.clone(),
        Arc::new(RssAdapter::new()),
        config.fetch_interval(),
        config.filter_keywords.clone(),
    );

    let notifier = Notifier::new(
        repository.clone(),
        ContentExtractor::new(),
        summarizer,
        Box::new(TelegramPublisher::new(bot_token, config.telegram_channel_id)),
        config.notify_interval(),
        config.lookup_window(),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let fetch_task = tokio::spawn({
        let shutdown = shutdown_rx.clone();
        async move { fetcher.run(shutdown).await }
    });
    let notify_task = tokio::spawn(async move { notifier.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    let _ = shutdown_tx.send(true);

    let _ = fetch_task.await;
    let _ = notify_task.await;

    Ok(())
}

/// Registers any configured feeds that are not in the store yet. Tracks
/// urls as it goes, so a feed_url repeated in the config is registered once.
async fn seed_sources(repository: &Repository, config: &Config) -> Result<()> {
    let mut known: HashSet<String> = repository
        .all_sources()
        .await?
        .into_iter()
        .map(|s| s.feed_url)
        .collect();

    for entry in &config.sources {
        if !known.insert(entry.feed_url.clone()) {
            continue;
        }
        let id = repository.add_source(&entry.name, &entry.feed_url).await?;
        tracing::info!("registered source {} (id {id})", entry.name);
    }

    Ok(())
}
