#[cfg(feature = "sqlite")]
use std::path::PathBuf;
use std::sync::Arc;

use an_core::{ArticleStorage, Error, Result};
use async_trait::async_trait;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn new() -> Result<Self> where Self: Sized;
}

fn backend_error(hint: &str, e: Error) -> Error {
    Error::Storage(format!("{} ({})", hint, e))
}

/// Builds the storage backend named on the command line.
#[cfg_attr(not(feature = "sqlite"), allow(unused_variables))]
pub async fn create_storage(
    kind: &str,
    backend_url: Option<&str>,
) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        "memory" => {
            let storage = <InMemoryStorage as StorageBackend>::new()
                .await
                .map_err(|e| backend_error(InMemoryStorage::get_error_message(), e))?;
            Ok(Arc::new(storage))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let storage = match backend_url {
                Some(path) => SQLiteStorage::new_with_path(&PathBuf::from(path)).await,
                None => <SQLiteStorage as StorageBackend>::new().await,
            }
            .map_err(|e| backend_error(SQLiteStorage::get_error_message(), e))?;
            Ok(Arc::new(storage))
        }
        other => Err(Error::Storage(format!("Unsupported storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        assert!(!storage.exists_article_with_url("https://example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_unknown_storage() {
        assert!(create_storage("qdrant", None).await.is_err());
    }
}
