use std::fmt;
use std::time::Duration;

use an_core::{Error, Result, SummarizationModel};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{http_client, instruction, request_timeout, ModelConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::Config;

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Clone)]
pub struct ChatModelConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ChatModelConfig {
    pub fn openai() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            ..Self::deepseek()
        }
    }

    pub fn deepseek() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: String::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Default for ChatModelConfig {
    fn default() -> Self {
        Self::deepseek()
    }
}

impl ModelConfig for ChatModelConfig {
    /// `openai` starts from OpenAI's endpoint and model, `deepseek` and `chat` from DeepSeek's.
    fn from_config(config: &Config) -> Self {
        let defaults = match config.model_name.as_deref() {
            Some("openai") => Self::openai(),
            _ => Self::deepseek(),
        };
        Self {
            base_url: config
                .model_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: config.model_id.clone().unwrap_or(defaults.model),
            api_key: config.api_key.clone().unwrap_or_default(),
            timeout: request_timeout(config),
        }
    }
}

/// Any OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatModel {
    client: Client,
    config: ChatModelConfig,
}

impl ChatModel {
    pub fn new(config: ChatModelConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            config,
        })
    }
}

impl fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

#[async_trait]
impl SummarizationModel for ChatModel {
    fn name(&self) -> &str {
        "chat"
    }

    async fn summarize_text(&self, text: &str, max_len: usize, min_len: usize) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: instruction(max_len, min_len),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Summarization(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Summarization(e.to_string()))?
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::Summarization(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| Error::Summarization("Model returned no choices".to_string()))
    }
}
