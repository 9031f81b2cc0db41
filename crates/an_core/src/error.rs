use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid selector {selector:?} for source {source_id}")]
    InvalidSelector { source_id: String, selector: String },

    #[error("Failed to fetch {url}: {cause}")]
    Fetch { url: String, cause: String },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Could not parse date {raw:?} with format {format:?}")]
    DateParse { raw: String, format: String },

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn fetch(url: impl Into<String>, cause: impl ToString) -> Self {
        Error::Fetch {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    /// Configuration errors are the only ones allowed to abort a whole run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownSource(_) | Error::UnknownCategory(_) | Error::InvalidSelector { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
