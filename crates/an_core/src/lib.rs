pub mod error;
pub mod inference;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use inference::SummarizationModel;
pub use storage::ArticleStorage;
pub use types::{
    ArticleRecord, ArticleStub, Category, CategoryCode, InsertOutcome, NewArticle,
    ResolvedArticle, SourceConfig,
};
