//! Bounded summarization on top of a [`SummarizationModel`].
//!
//! Input is cut to a token budget before it reaches the model, and model failures turn into
//! a sentinel string so a missing summary never stops an article from being stored.

use std::sync::Arc;

use an_core::SummarizationModel;
use tracing::{debug, error};

pub const NO_CONTENT: &str = "No content available.";
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

pub const DEFAULT_MAX_LEN: usize = 130;
pub const DEFAULT_MIN_LEN: usize = 30;
pub const DEFAULT_TOKEN_BUDGET: usize = 1024;

/// Keeps the first `budget` whitespace-separated tokens of `text`.
pub fn truncate_to_budget(text: &str, budget: usize) -> String {
    text.split_whitespace().take(budget).collect::<Vec<_>>().join(" ")
}

#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn SummarizationModel>,
    token_budget: usize,
}

impl Summarizer {
    pub fn new(model: Arc<dyn SummarizationModel>) -> Self {
        Self {
            model,
            token_budget: DEFAULT_TOKEN_BUDGET,
        }
    }

    pub fn with_token_budget(mut self, token_budget: usize) -> Self {
        self.token_budget = token_budget;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub async fn summarize(&self, content: &str, max_len: usize, min_len: usize) -> String {
        if content.trim().is_empty() {
            return NO_CONTENT.to_string();
        }

        let input = truncate_to_budget(content, self.token_budget);
        debug!(model = self.model.name(), tokens = input.split(' ').count(), "summarizing");

        match self.model.summarize_text(&input, max_len, min_len).await {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => {
                error!(model = self.model.name(), "summarization returned an empty summary");
                SUMMARY_UNAVAILABLE.to_string()
            }
            Err(e) => {
                error!(model = self.model.name(), error = %e, "summarization failed");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}
