use async_trait::async_trait;

use crate::Result;

/// Summarization collaborator. Implementations may be model-backed or rule-based.
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    fn name(&self) -> &str;

    /// Summarize `text` to roughly between `min_len` and `max_len` words.
    async fn summarize_text(&self, text: &str, max_len: usize, min_len: usize) -> Result<String>;
}
