use std::fmt;
use std::time::Duration;

use an_core::{Error, Result, SummarizationModel};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{http_client, instruction, request_timeout, ModelConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::Config;

const DEFAULT_MODEL_URL: &str = "http://localhost:11434/gemma3:12b";

#[derive(Debug, Clone)]
pub struct OllamaModelConfig {
    ollama_host: String,
    ollama_port: u16,
    model_name: String,
    timeout: Duration,
}

impl Default for OllamaModelConfig {
    fn default() -> Self {
        Self {
            ollama_host: "http://localhost".to_string(),
            ollama_port: 11434,
            model_name: "gemma3:12b".to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ModelConfig for OllamaModelConfig {
    /// The model URL carries the model name in its path, e.g. `http://localhost:11434/gemma3:12b`.
    /// An explicit model id wins over the path.
    fn from_config(config: &Config) -> Self {
        let defaults = Self {
            timeout: request_timeout(config),
            ..Self::default()
        };
        let url = config.model_url.as_deref().unwrap_or(DEFAULT_MODEL_URL);
        let Ok(parsed_url) = Url::parse(url) else {
            return Self {
                model_name: config.model_id.clone().unwrap_or(defaults.model_name),
                ..defaults
            };
        };

        let path_model = parsed_url.path().trim_start_matches('/').to_string();
        let model_name = match &config.model_id {
            Some(id) => id.clone(),
            None if path_model.is_empty() => defaults.model_name,
            None => path_model,
        };

        Self {
            ollama_host: format!(
                "{}://{}",
                parsed_url.scheme(),
                parsed_url.host_str().unwrap_or("localhost")
            ),
            ollama_port: parsed_url.port().unwrap_or(defaults.ollama_port),
            model_name,
            timeout: defaults.timeout,
        }
    }
}

impl OllamaModelConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}/api/generate", self.ollama_host, self.ollama_port)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaModel {
    client: Client,
    config: OllamaModelConfig,
}

impl OllamaModel {
    pub fn new(config: OllamaModelConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            config,
        })
    }
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("endpoint", &self.config.endpoint())
            .field("model", &self.config.model_name)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

#[async_trait]
impl SummarizationModel for OllamaModel {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn summarize_text(&self, text: &str, max_len: usize, min_len: usize) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model_name,
            prompt: format!("{}\n\n{}", instruction(max_len, min_len), text),
            stream: false,
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Summarization(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Summarization(e.to_string()))?
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Summarization(e.to_string()))?;

        Ok(response.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_config_from_model_url() {
        let config = Config {
            model_url: Some("http://gpu-box:8000/llama3:8b".to_string()),
            ..Config::default()
        };
        let ollama = OllamaModelConfig::from_config(&config);
        assert_eq!(ollama.endpoint(), "http://gpu-box:8000/api/generate");
        assert_eq!(ollama.model_name(), "llama3:8b");
    }

    #[test]
    fn test_model_id_overrides_path() {
        let config = Config {
            model_url: Some("http://gpu-box:8000/llama3:8b".to_string()),
            model_id: Some("qwen2:7b".to_string()),
            timeout: Some(Duration::from_secs(300)),
            ..Config::default()
        };
        let ollama = OllamaModelConfig::from_config(&config);
        assert_eq!(ollama.endpoint(), "http://gpu-box:8000/api/generate");
        assert_eq!(ollama.model_name(), "qwen2:7b");
        assert_eq!(ollama.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_config_defaults() {
        let ollama = OllamaModelConfig::from_config(&Config::default());
        assert_eq!(ollama.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(ollama.model_name(), "gemma3:12b");
    }

    #[tokio::test]
    async fn test_summarize_text() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model":"tiny","response":"Local summary.","done":true}"#)
            .expect(1)
            .create_async()
            .await;

        let config = Config {
            model_url: Some(format!("{}/tiny", server.url())),
            ..Config::default()
        };
        let model = OllamaModel::new(OllamaModelConfig::from_config(&config)).unwrap();
        let summary = model.summarize_text("Article text.", 130, 30).await.unwrap();

        assert_eq!(summary, "Local summary.");
        m.assert_async().await;
    }
}
