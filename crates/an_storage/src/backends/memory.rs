use std::collections::HashMap;
use std::sync::Arc;

use an_core::{ArticleRecord, ArticleStorage, Category, InsertOutcome, NewArticle, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryStore {
    categories: Vec<Category>,
    articles: Vec<ArticleRecord>,
    by_url: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_category(&self, name: &str) -> Option<Category> {
        self.categories.iter().find(|c| c.name == name).cloned()
    }

    fn create_category(&mut self, name: &str) -> Category {
        if let Some(existing) = self.find_category(name) {
            return existing;
        }
        let category = Category {
            id: self.categories.len() as i64 + 1,
            name: name.to_string(),
        };
        self.categories.push(category.clone());
        category
    }

    fn create_article(&mut self, article: NewArticle) -> InsertOutcome {
        if self.by_url.contains_key(&article.url) {
            return InsertOutcome::AlreadyExists;
        }
        let record = ArticleRecord {
            id: self.articles.len() as i64 + 1,
            title: article.title,
            url: article.url,
            summary: article.summary,
            category: article.category,
            publication_date: article.publication_date,
        };
        self.by_url.insert(record.url.clone(), self.articles.len());
        self.articles.push(record.clone());
        InsertOutcome::Created(record)
    }
}

/// Process-local storage. The write lock makes create-if-absent atomic per URL.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored articles in insertion order.
    pub async fn articles(&self) -> Vec<ArticleRecord> {
        self.store.read().await.articles.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.store.read().await.categories.clone()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new() -> Result<Self> where Self: Sized {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self.store.read().await.find_category(name))
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        Ok(self.store.write().await.create_category(name))
    }

    async fn exists_article_with_url(&self, url: &str) -> Result<bool> {
        Ok(self.store.read().await.by_url.contains_key(url))
    }

    async fn create_article(&self, article: NewArticle) -> Result<InsertOutcome> {
        Ok(self.store.write().await.create_article(article))
    }
}
