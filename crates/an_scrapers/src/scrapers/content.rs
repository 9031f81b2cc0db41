use std::sync::Arc;

use an_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::utils;
use crate::fetcher::Fetcher;

/// Container idioms tried in order, as (tag, class).
const CONTAINERS: &[(&str, &str)] = &[
    ("div", "entry-content"),
    ("div", "article-content"),
    ("div", "main-content"),
    ("div", "post-content"),
    ("div", "article-body"),
    ("section", "article-body"),
    ("div", "article__body"),
    ("div", "body__inner-container"),
    ("div", "duet--article--article-body-component"),
    ("div", "caas-body"),
    ("div", "c-articleContent"),
];

/// Tag-only containers tried after every class-based one.
const LANDMARKS: &[&str] = &["main", "article"];

/// One way of pulling article text out of a page.
pub type ContentStrategy = Box<dyn Fn(&Html) -> Option<String> + Send + Sync>;

/// Text of all `<p>` under `container`, trimmed and joined by a single space.
pub fn paragraph_text(container: ElementRef<'_>, paragraphs: &Selector) -> String {
    container
        .select(paragraphs)
        .map(utils::clean_text)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn container_strategy(selector: Selector, paragraphs: Selector) -> ContentStrategy {
    Box::new(move |document: &Html| {
        document
            .select(&selector)
            .map(|container| paragraph_text(container, &paragraphs))
            .find(|text| !text.is_empty())
    })
}

/// Ordered chain of content strategies; the first non-empty result wins.
pub struct ContentChain {
    strategies: Vec<(String, ContentStrategy)>,
}

impl ContentChain {
    pub fn new() -> Self {
        Self { strategies: Vec::new() }
    }

    /// The class-based containers followed by `<main>` and `<article>`.
    pub fn standard() -> Result<Self> {
        let mut chain = Self::new();
        for (tag, class) in CONTAINERS {
            chain = chain.with_container(&format!("{}.{}", tag, class))?;
        }
        for tag in LANDMARKS {
            chain = chain.with_container(tag)?;
        }
        Ok(chain)
    }

    /// Appends a strategy reading paragraphs under elements matching `css`.
    pub fn with_container(self, css: &str) -> Result<Self> {
        let selector = utils::parse_selector("content", css)?;
        let paragraphs = utils::parse_selector("content", "p")?;
        Ok(self.with_strategy(css, container_strategy(selector, paragraphs)))
    }

    pub fn with_strategy(mut self, name: &str, strategy: ContentStrategy) -> Self {
        self.strategies.push((name.to_string(), strategy));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        self.strategies.iter().find_map(|(name, strategy)| {
            let text = strategy(&document)?;
            debug!(strategy = %name, chars = text.len(), "content found");
            Some(text)
        })
    }
}

impl Default for ContentChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of resolving one article page.
#[derive(Debug)]
pub enum Resolution {
    Content(String),
    /// The page was fetched but no strategy found any text.
    Empty,
    Unreachable(Error),
}

impl Resolution {
    pub fn into_content(self) -> Option<String> {
        match self {
            Resolution::Content(text) => Some(text),
            Resolution::Empty | Resolution::Unreachable(_) => None,
        }
    }
}

pub struct ContentResolver {
    fetcher: Arc<dyn Fetcher>,
    chain: ContentChain,
}

impl ContentResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, chain: ContentChain) -> Self {
        Self { fetcher, chain }
    }

    pub fn standard(fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Ok(Self::new(fetcher, ContentChain::standard()?))
    }

    pub async fn resolve_detailed(&self, url: &str) -> Resolution {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = %e, "article page unreachable");
                return Resolution::Unreachable(e);
            }
        };

        match self.chain.extract(&html) {
            Some(text) => Resolution::Content(text),
            None => {
                debug!(url, "no content container matched");
                Resolution::Empty
            }
        }
    }

    /// Article text, or `None` when the page is unreachable or has no recognizable content.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        self.resolve_detailed(url).await.into_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::MockFetcher;

    fn chain() -> ContentChain {
        ContentChain::standard().unwrap()
    }

    #[test]
    fn test_entry_content_fallback() {
        let html = r#"
            <html><body>
                <div class="sidebar"><p>Subscribe now</p></div>
                <div class="entry-content">
                    <p>First paragraph.</p>
                    <p>
                        Second   paragraph.
                    </p>
                </div>
            </body></html>"#;
        assert_eq!(chain().extract(html).unwrap(), "First paragraph. Second paragraph.");
    }

    #[test]
    fn test_later_container_is_found() {
        let html = r#"<div class="article-body"><p>Deep in the chain.</p></div>"#;
        assert_eq!(chain().extract(html).unwrap(), "Deep in the chain.");
    }

    #[test]
    fn test_chain_order_wins() {
        let html = r#"
            <div class="post-content"><p>Post content.</p></div>
            <div class="article-content"><p>Article content.</p></div>"#;
        assert_eq!(chain().extract(html).unwrap(), "Article content.");
    }

    #[test]
    fn test_empty_container_does_not_stop_the_chain() {
        let html = r#"
            <div class="entry-content"><p>   </p><span>no paragraphs</span></div>
            <div class="main-content"><p>Real text.</p></div>"#;
        assert_eq!(chain().extract(html).unwrap(), "Real text.");
    }

    #[test]
    fn test_main_then_article_landmarks() {
        let html = r#"<main><p>Main text.</p></main><article><p>Article text.</p></article>"#;
        assert_eq!(chain().extract(html).unwrap(), "Main text.");

        let html = r#"<main><div>nothing</div></main><article><p>Article text.</p></article>"#;
        assert_eq!(chain().extract(html).unwrap(), "Article text.");
    }

    #[test]
    fn test_no_content() {
        assert!(chain().extract("<div class=\"content\"><p>Not ours.</p></div>").is_none());
        assert!(chain().extract("").is_none());
    }

    #[test]
    fn test_custom_strategy() {
        let chain = ContentChain::new()
            .with_strategy("always", Box::new(|_: &Html| Some("fixed".to_string())));
        assert_eq!(chain.names(), vec!["always"]);
        assert_eq!(chain.extract("<p>x</p>").unwrap(), "fixed");
    }

    #[tokio::test]
    async fn test_resolve() {
        let fetcher = MockFetcher::new()
            .with_page("https://example.com/a", r#"<div class="article-content"><p>Test paragraph 1</p><p>Test paragraph 2</p></div>"#)
            .with_page("https://example.com/empty", "<div></div>");
        let resolver = ContentResolver::standard(Arc::new(fetcher)).unwrap();

        assert_eq!(
            resolver.resolve("https://example.com/a").await.unwrap(),
            "Test paragraph 1 Test paragraph 2"
        );
        assert!(matches!(resolver.resolve_detailed("https://example.com/empty").await, Resolution::Empty));
        assert!(matches!(
            resolver.resolve_detailed("https://example.com/missing").await,
            Resolution::Unreachable(Error::Fetch { .. })
        ));
        assert!(resolver.resolve("https://example.com/missing").await.is_none());
    }
}
