use async_trait::async_trait;

use crate::types::{Category, InsertOutcome, NewArticle};
use crate::Result;

/// Persistence collaborator. Records are only ever created, never updated or deleted.
#[async_trait]
pub trait ArticleStorage: Send + Sync {
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Creates a category, or returns the existing one when the name is taken.
    async fn create_category(&self, name: &str) -> Result<Category>;

    async fn exists_article_with_url(&self, url: &str) -> Result<bool>;

    /// Inserts the article unless one with the same URL already exists.
    async fn create_article(&self, article: NewArticle) -> Result<InsertOutcome>;

    async fn get_or_create_category(&self, name: &str) -> Result<Category> {
        match self.find_category_by_name(name).await? {
            Some(category) => Ok(category),
            None => self.create_category(name).await,
        }
    }
}
