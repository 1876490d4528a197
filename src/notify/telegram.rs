use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Delivers a formatted message to the output channel. The text must already
/// be escaped for the channel's markup dialect.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    description: Option<String>,
}

pub struct TelegramPublisher {
    client: Client,
    bot_token: String,
    channel_id: i64,
}

impl TelegramPublisher {
    pub fn new(bot_token: String, channel_id: i64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            bot_token,
            channel_id,
        }
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        let request = SendMessageRequest {
            chat_id: self.channel_id,
            text,
            parse_mode: "MarkdownV2",
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::Telegram(format!("API error: {error_text}")));
        }

        let body: SendMessageResponse = response.json().await?;
        if !body.ok {
            return Err(AppError::Telegram(
                body.description
                    .unwrap_or_else(|| "sendMessage rejected".to_string()),
            ));
        }

        Ok(())
    }
}
