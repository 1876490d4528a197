use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::summary::Summarizer;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_COMPLETION_TOKENS: u32 = 400;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Generative summarizer backed by the OpenAI chat-completions API.
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    model: String,
    prompt: String,
    // one in-flight completion at a time per instance
    lock: Mutex<()>,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model: String, prompt: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key,
            model,
            prompt,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let _guard = self.lock.lock().await;

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: 1.0,
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::OpenAi(format!("API error: {error_text}")));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let raw = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| AppError::OpenAi("no choices in response".to_string()))?;

        Ok(truncate_at_sentence(&raw))
    }
}

/// Cuts everything after the last sentence-terminating period so a summary
/// clipped by the token limit never ends mid-sentence.
fn truncate_at_sentence(raw: &str) -> String {
    if raw.ends_with('.') {
        return raw.to_string();
    }

    // no period anywhere means the whole completion is one dangling
    // fragment; drop it rather than publish a mid-word clip
    match raw.rfind('.') {
        Some(idx) => raw[..=idx].to_string(),
        None => ".".to_string(),
    }
}
