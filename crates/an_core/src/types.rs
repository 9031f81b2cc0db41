use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short stable identifier of a topical category, e.g. `AI` or `IoT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryCode(pub String);

impl CategoryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// Everything needed to scrape one website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub base_url: String,
    pub category_paths: BTreeMap<CategoryCode, String>,
    pub article_selector: String,
    pub title_selector: String,
    pub link_selector: String,
    pub author_selector: String,
    pub date_selector: String,
    pub date_format: String,
}

impl SourceConfig {
    pub fn supports(&self, category: &CategoryCode) -> bool {
        self.category_paths.contains_key(category)
    }
}

/// An article reference taken from a listing page, not yet resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleStub {
    pub title: String,
    /// Always absolute.
    pub url: String,
    pub raw_date: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArticle {
    pub stub: ArticleStub,
    pub content: String,
    pub publication_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A stored article. The URL is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub category: Category,
    pub publication_date: DateTime<Utc>,
}

/// Fields of an article about to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub category: Category,
    pub publication_date: DateTime<Utc>,
}

/// Result of a create-if-absent insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(ArticleRecord),
    AlreadyExists,
}

impl InsertOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}
