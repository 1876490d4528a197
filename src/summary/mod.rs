mod openai;
mod trim;

pub use openai::OpenAiSummarizer;
pub use trim::TrimSummarizer;

use async_trait::async_trait;

use crate::error::Result;

/// Produces a short human-readable summary of plain article text.
/// Implementations serialize their own in-flight calls; the notify loop
/// issues at most one call per cycle, but adjacent ticks may overlap.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}
