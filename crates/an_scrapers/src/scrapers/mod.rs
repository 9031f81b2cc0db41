use an_core::{Error, Result, SourceConfig};
use scraper::{ElementRef, Selector};
use url::Url;

pub mod content;
pub mod dates;
pub mod listing;

pub use content::{ContentChain, ContentResolver, Resolution};
pub use dates::{parse_date, try_parse_date};
pub use listing::{extract_stubs, DEFAULT_LISTING_LIMIT};

/// Selectors of one source, compiled.
pub struct SourceSelectors {
    pub article: Selector,
    pub title: Selector,
    pub link: Selector,
    pub author: Selector,
    pub date: Selector,
}

impl SourceSelectors {
    pub fn compile(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            article: utils::parse_selector(&config.id, &config.article_selector)?,
            title: utils::parse_selector(&config.id, &config.title_selector)?,
            link: utils::parse_selector(&config.id, &config.link_selector)?,
            author: utils::parse_selector(&config.id, &config.author_selector)?,
            date: utils::parse_selector(&config.id, &config.date_selector)?,
        })
    }
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use super::*;

    pub fn parse_selector(source_id: &str, selector: &str) -> Result<Selector> {
        Selector::parse(selector).map_err(|_| Error::InvalidSelector {
            source_id: source_id.to_string(),
            selector: selector.to_string(),
        })
    }

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// Joins `href` onto `base`; absolute hrefs are returned unchanged.
    pub fn absolute_url(base: &str, href: &str) -> Result<String> {
        let href = href.trim();
        if href.is_empty() {
            return Err(Error::Extraction("empty href".to_string()));
        }
        let joined = parse_url(base)?
            .join(href)
            .map_err(|e| Error::InvalidUrl(format!("{} joined with {}: {}", base, href, e)))?;
        Ok(joined.to_string())
    }

    /// Text of an element with runs of whitespace collapsed.
    pub fn clean_text(element: ElementRef<'_>) -> String {
        element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
