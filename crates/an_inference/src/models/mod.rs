use std::sync::Arc;
use std::time::Duration;

use an_core::{Error, Result, SummarizationModel};
use reqwest::Client;

use crate::Config;

pub mod chat;
pub mod extractive;
pub mod ollama;

pub use chat::ChatModel;
pub use extractive::ExtractiveModel;
pub use ollama::OllamaModel;

/// Backend-specific settings derived from the shared [`Config`].
pub trait ModelConfig {
    fn from_config(config: &Config) -> Self;
}

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn request_timeout(config: &Config) -> Duration {
    config.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
}

/// A stalled model endpoint must not hold an article slot forever.
pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Summarization(format!("could not build model client: {}", e)))
}

pub(crate) fn instruction(max_len: usize, min_len: usize) -> String {
    format!(
        "Summarize the following news article in plain prose, between {} and {} words. \
         Reply with the summary only.",
        min_len, max_len
    )
}

pub fn create_model(config: &Config) -> Result<Arc<dyn SummarizationModel>> {
    let name = config.model_name.as_deref().unwrap_or("extractive");
    match name {
        "extractive" => Ok(Arc::new(ExtractiveModel::new())),
        "openai" | "deepseek" | "chat" => {
            Ok(Arc::new(ChatModel::new(chat::ChatModelConfig::from_config(config))?))
        }
        "ollama" => Ok(Arc::new(OllamaModel::new(
            ollama::OllamaModelConfig::from_config(config),
        )?)),
        other => Err(Error::Summarization(format!("Unknown model: {}", other))),
    }
}
