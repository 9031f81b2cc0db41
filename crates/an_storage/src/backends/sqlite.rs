use std::path::PathBuf;
use std::time::Duration;

use an_core::{ArticleRecord, ArticleStorage, Category, Error, InsertOutcome, NewArticle, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use tracing::debug;

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        summary TEXT NOT NULL,
        category_id INTEGER NOT NULL REFERENCES categories(id),
        publication_date TEXT NOT NULL
    )
    "#,
];

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable (default ./articles.db)"
    }

    async fn new() -> Result<Self> {
        let db_path = PathBuf::from("articles.db");
        Self::new_with_path(&db_path).await
    }
}

fn db_error(context: &str, e: sqlx::Error) -> Error {
    Error::Database(format!("{}: {}", context, e))
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| db_error(&format!("Failed to run migration {}", i), e))?;
        }
        debug!(path = %db_path.display(), "sqlite storage ready");

        Ok(Self {
            pool,
            db_path: db_path.clone(),
        })
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }

    pub async fn count_articles(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM articles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count articles", e))?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to look up category", e))?;

        Ok(row.map(|row| Category {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        sqlx::query("INSERT OR IGNORE INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to create category", e))?;

        self.find_category_by_name(name)
            .await?
            .ok_or_else(|| Error::Storage(format!("Category {} vanished after insert", name)))
    }

    async fn exists_article_with_url(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM articles WHERE url = ?) AS found")
            .bind(url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to check article", e))?;
        Ok(row.get::<i64, _>("found") != 0)
    }

    async fn create_article(&self, article: NewArticle) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (title, url, summary, category_id, publication_date)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.summary)
        .bind(article.category.id)
        .bind(article.publication_date.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to store article", e))?;

        if result.rows_affected() == 0 {
            return Ok(InsertOutcome::AlreadyExists);
        }

        Ok(InsertOutcome::Created(ArticleRecord {
            id: result.last_insert_rowid(),
            title: article.title,
            url: article.url,
            summary: article.summary,
            category: article.category,
            publication_date: article.publication_date,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_storage() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        let category = storage.get_or_create_category("Artificial Intelligence").await.unwrap();
        let again = storage.get_or_create_category("Artificial Intelligence").await.unwrap();
        assert_eq!(category, again);

        let article = NewArticle {
            title: "Test Article".to_string(),
            url: "http://example.com/a".to_string(),
            summary: "Summary".to_string(),
            category: category.clone(),
            publication_date: Utc::now(),
        };

        assert!(!storage.exists_article_with_url(&article.url).await.unwrap());
        assert!(storage.create_article(article.clone()).await.unwrap().is_created());
        assert!(storage.exists_article_with_url(&article.url).await.unwrap());
        assert_eq!(
            storage.create_article(article).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(storage.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_create_once() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("race.db");
        let storage = Arc::new(SQLiteStorage::new_with_path(&db_path).await.unwrap());
        let category = storage.get_or_create_category("Security").await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = Arc::clone(&storage);
                let article = NewArticle {
                    title: format!("Copy {}", i),
                    url: "https://example.com/same".to_string(),
                    summary: "Summary".to_string(),
                    category: category.clone(),
                    publication_date: Utc::now(),
                };
                tokio::spawn(async move { storage.create_article(article).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_created() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(storage.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reopen_keeps_records() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
            storage.create_category("Robotics").await.unwrap();
        }

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        let found = storage.find_category_by_name("Robotics").await.unwrap();
        assert!(found.is_some());
        assert_eq!(storage.get_db_path(), &db_path);
    }
}
