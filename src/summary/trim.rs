use async_trait::async_trait;

use crate::error::Result;
use crate::summary::Summarizer;

const MAX_SUMMARY_WORDS: usize = 100;

/// Extractive fallback used when no OpenAI credential is configured.
/// Deterministic and infallible.
pub struct TrimSummarizer;

#[async_trait]
impl Summarizer for TrimSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        Ok(smart_trim(text, MAX_SUMMARY_WORDS))
    }
}

/// Accumulates whole sentences, in order, until adding the next one would
/// exceed the word budget.
pub fn smart_trim(text: &str, max_words: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut word_count = 0;

    for sentence in text.split(['.', '!', '?']) {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            continue;
        }

        let words = trimmed.split_whitespace().count();
        if word_count + words > max_words {
            break;
        }

        kept.push(trimmed);
        word_count += words;
    }

    format!("{}.", kept.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_under_budget_is_kept_whole() {
        let text = "First sentence here. Second one follows! Third asks a question?";
        assert_eq!(
            smart_trim(text, 100),
            "First sentence here. Second one follows. Third asks a question."
        );
    }

    #[test]
    fn truncates_to_maximal_prefix_of_whole_sentences() {
        let text = "one two three. four five six. seven eight nine.";
        // budget of 7 admits the first two sentences (6 words), not the third
        assert_eq!(smart_trim(text, 7), "one two three. four five six.");
    }

    #[test]
    fn oversized_first_sentence_yields_bare_period() {
        let text = "this single sentence is far too long for the budget.";
        assert_eq!(smart_trim(text, 3), ".");
    }

    #[test]
    fn order_is_preserved() {
        let text = "a b. c d. e f.";
        assert_eq!(smart_trim(text, 4), "a b. c d.");
    }
}
