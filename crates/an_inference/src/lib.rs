use std::time::Duration;

pub mod models;
pub mod summarizer;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    /// Backend kind: extractive, openai, deepseek, chat or ollama.
    pub model_name: Option<String>,
    pub model_url: Option<String>,
    /// Model to request from the backend, overriding its default.
    pub model_id: Option<String>,
    /// Upper bound for one summarization request.
    pub timeout: Option<Duration>,
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use super::summarizer::Summarizer;
    pub use an_core::{Error, Result, SummarizationModel};
}

pub use models::create_model;
pub use summarizer::{Summarizer, NO_CONTENT, SUMMARY_UNAVAILABLE};
