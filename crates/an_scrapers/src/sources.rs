//! Static catalog of the websites we scrape and the categories they cover.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use an_core::{CategoryCode, Error, Result, SourceConfig};
use lazy_static::lazy_static;

use crate::scrapers::{utils, SourceSelectors};

struct StaticSource {
    id: &'static str,
    base_url: &'static str,
    categories: &'static [(&'static str, &'static str)],
    article: &'static str,
    title: &'static str,
    link: &'static str,
    author: &'static str,
    date: &'static str,
    date_format: &'static str,
}

const CATEGORIES: &[(&str, &str)] = &[
    ("AI", "Artificial Intelligence"),
    ("IoT", "Internet of Things"),
    ("CYB", "Cybersecurity"),
    ("ROB", "Robotics"),
    ("CLD", "Cloud Computing"),
];

const SOURCES: &[StaticSource] = &[
    StaticSource {
        id: "techcrunch",
        base_url: "https://techcrunch.com",
        categories: &[
            ("AI", "/category/artificial-intelligence/"),
            ("ROB", "/category/robotics/"),
            ("CYB", "/category/security/"),
        ],
        article: "li.wp-block-post",
        title: "h3.loop-card__title",
        link: "h3.loop-card__title a",
        author: "a.loop-card__author",
        date: "time.loop-card__time",
        date_format: "%Y-%m-%dT%H:%M:%S%z",
    },
    StaticSource {
        id: "theverge",
        base_url: "https://www.theverge.com",
        categories: &[
            ("AI", "/ai-artificial-intelligence"),
            ("CYB", "/cyber-security"),
        ],
        article: "article",
        title: "h2",
        link: "h2 a",
        author: "span.author",
        date: "time",
        date_format: "%Y-%m-%dT%H:%M:%S%.fZ",
    },
    StaticSource {
        id: "wired",
        base_url: "https://www.wired.com",
        categories: &[
            ("AI", "/tag/artificial-intelligence/"),
            ("CYB", "/category/security/"),
            ("ROB", "/tag/robotics/"),
        ],
        article: "div.summary-item",
        title: "h3.summary-item__hed",
        link: "a.summary-item__hed-link",
        author: "span.byline__name",
        date: "time.summary-item__publish-date",
        date_format: "%B %d, %Y",
    },
    StaticSource {
        id: "venturebeat",
        base_url: "https://venturebeat.com",
        categories: &[
            ("AI", "/category/ai/"),
            ("CYB", "/category/security/"),
            ("CLD", "/category/data-infrastructure/"),
        ],
        article: "article.ArticleListing",
        title: "h2.ArticleListing__title",
        link: "a.ArticleListing__title-link",
        author: "a.ArticleListing__author",
        date: "time.ArticleListing__time",
        date_format: "%Y-%m-%dT%H:%M:%S%z",
    },
    StaticSource {
        id: "zdnet",
        base_url: "https://www.zdnet.com",
        categories: &[
            ("AI", "/topic/artificial-intelligence/"),
            ("IoT", "/topic/internet-of-things/"),
            ("CLD", "/topic/cloud/"),
            ("CYB", "/topic/security/"),
        ],
        article: "div.c-listingDefault_item",
        title: "h3.c-listingDefault_title",
        link: "a.c-listingDefault_itemLink",
        author: "span.c-listingDefault_author",
        date: "span.c-listingDefault_pubDate",
        date_format: "%m/%d/%Y",
    },
    StaticSource {
        id: "arstechnica",
        base_url: "https://arstechnica.com",
        categories: &[
            ("AI", "/ai/"),
            ("CYB", "/security/"),
        ],
        article: "article",
        title: "h2",
        link: "h2 a",
        author: "span.author",
        date: "time",
        date_format: "%Y-%m-%dT%H:%M:%S%z",
    },
    StaticSource {
        id: "engadget",
        base_url: "https://www.engadget.com",
        categories: &[
            ("AI", "/ai/"),
            ("IoT", "/tag/internet-of-things/"),
            ("ROB", "/tag/robotics/"),
        ],
        article: "li.stream-item",
        title: "h4",
        link: "h4 a",
        author: "span.byline",
        date: "time",
        date_format: "%m.%d.%Y",
    },
];

impl StaticSource {
    fn to_config(&self) -> SourceConfig {
        SourceConfig {
            id: self.id.to_string(),
            base_url: self.base_url.to_string(),
            category_paths: self
                .categories
                .iter()
                .map(|(code, path)| (CategoryCode::from(*code), path.to_string()))
                .collect(),
            article_selector: self.article.to_string(),
            title_selector: self.title.to_string(),
            link_selector: self.link.to_string(),
            author_selector: self.author.to_string(),
            date_selector: self.date.to_string(),
            date_format: self.date_format.to_string(),
        }
    }
}

lazy_static! {
    static ref BUILTIN: Arc<SourceRegistry> = Arc::new(SourceRegistry::new(
        SOURCES.iter().map(StaticSource::to_config).collect(),
        CATEGORIES
            .iter()
            .map(|(code, name)| (CategoryCode::from(*code), name.to_string()))
            .collect(),
    ));
}

/// Immutable lookup from source id to its [`SourceConfig`], plus the category table.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
    categories: BTreeMap<CategoryCode, String>,
    category_order: Vec<CategoryCode>,
}

impl SourceRegistry {
    /// Sources and categories keep the order they are given in.
    pub fn new(sources: Vec<SourceConfig>, categories: Vec<(CategoryCode, String)>) -> Self {
        let category_order = categories.iter().map(|(code, _)| code.clone()).collect();
        Self {
            sources,
            categories: categories.into_iter().collect(),
            category_order,
        }
    }

    pub fn builtin() -> Arc<SourceRegistry> {
        BUILTIN.clone()
    }

    pub fn config_for(&self, source_id: &str) -> Result<&SourceConfig> {
        self.sources
            .iter()
            .find(|s| s.id == source_id)
            .ok_or_else(|| Error::UnknownSource(source_id.to_string()))
    }

    pub fn categories_for(&self, source_id: &str) -> Result<BTreeSet<CategoryCode>> {
        Ok(self.config_for(source_id)?.category_paths.keys().cloned().collect())
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn sources_for(&self, category: &CategoryCode) -> Vec<&SourceConfig> {
        self.sources.iter().filter(|s| s.supports(category)).collect()
    }

    pub fn category_codes(&self) -> Vec<CategoryCode> {
        self.category_order.clone()
    }

    pub fn category_name(&self, code: &CategoryCode) -> Result<&str> {
        self.categories
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownCategory(code.to_string()))
    }

    pub fn category_code(&self, name: &str) -> Result<CategoryCode> {
        self.categories
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(code, _)| code.clone())
            .ok_or_else(|| Error::UnknownCategory(name.to_string()))
    }

    /// Listing page of `source_id` for `category`.
    pub fn listing_url(&self, source_id: &str, category: &CategoryCode) -> Result<String> {
        let config = self.config_for(source_id)?;
        let path = config
            .category_paths
            .get(category)
            .ok_or_else(|| Error::UnknownCategory(format!("{} (source {})", category, source_id)))?;
        utils::absolute_url(&config.base_url, path)
    }

    /// Checks every source: base URL, selectors, and that each category it declares is known.
    pub fn validate(&self) -> Result<()> {
        for source in &self.sources {
            utils::parse_url(&source.base_url)?;
            SourceSelectors::compile(source)?;
            for code in source.category_paths.keys() {
                self.category_name(code)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = SourceRegistry::builtin();
        registry.validate().unwrap();
        assert_eq!(registry.source_ids().len(), 7);
        assert_eq!(registry.category_codes().len(), 5);
    }

    #[test]
    fn test_config_for() {
        let registry = SourceRegistry::builtin();
        let config = registry.config_for("techcrunch").unwrap();
        assert_eq!(config.base_url, "https://techcrunch.com");
        assert_eq!(config.article_selector, "li.wp-block-post");

        let err = registry.config_for("myspace").unwrap_err();
        assert!(matches!(err, Error::UnknownSource(ref id) if id == "myspace"));
    }

    #[test]
    fn test_categories_for() {
        let registry = SourceRegistry::builtin();
        let categories = registry.categories_for("zdnet").unwrap();
        assert!(categories.contains(&CategoryCode::from("IoT")));
        assert!(categories.contains(&CategoryCode::from("AI")));
        assert!(!categories.contains(&CategoryCode::from("ROB")));
        assert!(registry.categories_for("nope").is_err());
    }

    #[test]
    fn test_sources_for_category() {
        let registry = SourceRegistry::builtin();
        let ai: Vec<_> = registry
            .sources_for(&CategoryCode::from("AI"))
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ai.len(), 7);
        assert_eq!(ai[0], "techcrunch");

        let iot = registry.sources_for(&CategoryCode::from("IoT"));
        assert_eq!(iot.len(), 2);
    }

    #[test]
    fn test_category_lookups() {
        let registry = SourceRegistry::builtin();
        let code = CategoryCode::from("CYB");
        assert_eq!(registry.category_name(&code).unwrap(), "Cybersecurity");
        assert_eq!(registry.category_code("Cybersecurity").unwrap(), code);
        assert!(registry.category_name(&CategoryCode::from("XYZ")).is_err());
    }

    #[test]
    fn test_listing_url() {
        let registry = SourceRegistry::builtin();
        assert_eq!(
            registry.listing_url("techcrunch", &CategoryCode::from("AI")).unwrap(),
            "https://techcrunch.com/category/artificial-intelligence/"
        );
        assert!(registry.listing_url("techcrunch", &CategoryCode::from("IoT")).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_selector() {
        let mut config = SourceRegistry::builtin().config_for("wired").unwrap().clone();
        config.title_selector = "h3[[".to_string();
        let registry = SourceRegistry::new(
            vec![config],
            vec![
                (CategoryCode::from("AI"), "Artificial Intelligence".to_string()),
                (CategoryCode::from("CYB"), "Cybersecurity".to_string()),
                (CategoryCode::from("ROB"), "Robotics".to_string()),
            ],
        );
        assert!(registry.validate().unwrap_err().is_configuration());
    }
}
