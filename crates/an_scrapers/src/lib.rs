pub mod cli;
pub mod fetcher;
pub mod logging;
pub mod manager;
pub mod scrapers;
pub mod sources;

pub use cli::{handle_command, HumanDuration, ScraperArgs, ScraperCommands};
pub use fetcher::{create_fetcher, Fetcher, FetcherConfig, HttpFetcher, RetryingFetcher};
pub use manager::{CategoryStats, Failure, PipelineConfig, RunPlan, RunReport, ScraperManager};
pub use sources::SourceRegistry;

pub mod prelude {
    pub use super::manager::{PipelineConfig, RunPlan, RunReport, ScraperManager};
    pub use super::sources::SourceRegistry;
    pub use an_core::{ArticleRecord, CategoryCode, Error, Result};
}
