use std::sync::Arc;
use std::time::Duration;

use an_core::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// Many sources reject the default client identity.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GETs `url` and returns the body. Non-2xx statuses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    /// Extra attempts after the first failure. Zero disables retrying.
    pub retries: u32,
    pub initial_backoff: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(15),
            retries: 0,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("HTTP status {}", status)));
        }

        response.text().await.map_err(|e| Error::fetch(url, e))
    }
}

/// Retries a failing fetch with exponential backoff.
pub struct RetryingFetcher<F> {
    inner: F,
    retries: u32,
    initial_backoff: Duration,
}

impl<F: Fetcher> RetryingFetcher<F> {
    pub fn new(inner: F, retries: u32, initial_backoff: Duration) -> Self {
        Self {
            inner,
            retries,
            initial_backoff,
        }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RetryingFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;
        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(url, attempt, error = %e, "fetch failed, retrying in {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

pub fn create_fetcher(config: &FetcherConfig) -> Result<Arc<dyn Fetcher>> {
    let fetcher = HttpFetcher::new(config)?;
    if config.retries == 0 {
        return Ok(Arc::new(fetcher));
    }
    Ok(Arc::new(RetryingFetcher::new(fetcher, config.retries, config.initial_backoff)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockito::Server;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves canned pages; any other URL fails like an unreachable host.
    #[derive(Default)]
    pub struct MockFetcher {
        pages: HashMap<String, String>,
        failing: Vec<String>,
        delays: HashMap<String, Duration>,
        hits: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub fn with_failure(mut self, url: &str) -> Self {
            self.failing.push(url.to_string());
            self
        }

        pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        pub fn hits(&self) -> Vec<String> {
            self.hits.lock().unwrap().clone()
        }

        pub fn was_fetched(&self, url: &str) -> bool {
            self.hits().iter().any(|hit| hit == url)
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.hits.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.iter().any(|f| f == url) {
                return Err(Error::fetch(url, "HTTP status 503 Service Unavailable"));
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::fetch(url, "connection refused"))
        }
    }

    struct FlakyFetcher {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for FlakyFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::fetch(url, "reset by peer"));
            }
            Ok("<html></html>".to_string())
        }
    }

    #[tokio::test]
    async fn test_http_fetch_sends_user_agent() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/listing")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .with_status(200)
            .with_body("<ul></ul>")
            .expect(1)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        let body = fetcher.fetch(&format!("{}/listing", server.url())).await.unwrap();

        assert_eq!(body, "<ul></ul>");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetch_rejects_error_status() {
        let mut server = Server::new_async().await;
        server.mock("GET", "/gone").with_status(404).create_async().await;

        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        let url = format!("{}/gone", server.url());
        let err = fetcher.fetch(&url).await.unwrap_err();

        match err {
            Error::Fetch { url: failed, cause } => {
                assert_eq!(failed, url);
                assert!(cause.contains("404"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_http_fetch_unreachable_host() {
        let fetcher = HttpFetcher::new(&FetcherConfig {
            timeout: Duration::from_secs(2),
            ..FetcherConfig::default()
        })
        .unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/nothing").await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_retrying_fetcher_recovers() {
        let flaky = FlakyFetcher {
            failures_left: AtomicUsize::new(2),
            calls: AtomicUsize::new(0),
        };
        let fetcher = RetryingFetcher::new(flaky, 3, Duration::from_millis(1));

        assert!(fetcher.fetch("https://example.com").await.is_ok());
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retrying_fetcher_gives_up() {
        let flaky = FlakyFetcher {
            failures_left: AtomicUsize::new(10),
            calls: AtomicUsize::new(0),
        };
        let fetcher = RetryingFetcher::new(flaky, 2, Duration::from_millis(1));

        assert!(fetcher.fetch("https://example.com").await.is_err());
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 3);
    }
}
