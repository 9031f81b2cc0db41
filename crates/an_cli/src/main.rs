use std::sync::Arc;
use std::time::Duration;

use an_core::Result;
use an_inference::{create_model, Summarizer};
use an_scrapers::cli::{handle_command, ScraperArgs, ScraperCommands};
use an_scrapers::fetcher::{create_fetcher, FetcherConfig, DEFAULT_USER_AGENT};
use an_scrapers::logging::init_logging;
use an_scrapers::{ScraperManager, SourceRegistry};
use clap::Parser;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape tech news by category, summarize and store it", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "memory")]
    storage: String,
    /// Backend location, e.g. the sqlite database path
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(
        long,
        default_value = "extractive",
        help = "Summarization model. Available models: extractive (default), ollama, deepseek, openai"
    )]
    model: String,
    #[arg(long)]
    model_url: Option<String>,
    /// Model requested from the backend, e.g. gpt-4o or llama3:8b
    #[arg(long)]
    model_id: Option<String>,
    /// Per-summarization timeout in seconds
    #[arg(long, default_value_t = 120)]
    model_timeout: u64,
    #[arg(long, env = "AN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, default_value = "info")]
    log_level: Level,
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout: u64,
    /// Extra attempts for failed page fetches
    #[arg(long, default_value_t = 0)]
    retries: u32,
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    Scrape {
        #[command(subcommand)]
        command: Option<ScraperCommands>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let registry = SourceRegistry::builtin();
    registry.validate()?;
    info!(sources = registry.source_ids().len(), "source catalog loaded");

    let storage = an_storage::create_storage(&cli.storage, cli.backend_url.as_deref()).await?;
    info!(backend = %cli.storage, "storage initialized");

    let model = create_model(&an_inference::Config {
        api_key: cli.api_key,
        model_name: Some(cli.model),
        model_url: cli.model_url,
        model_id: cli.model_id,
        timeout: Some(Duration::from_secs(cli.model_timeout)),
    })?;
    let summarizer = Summarizer::new(model);
    info!(model = summarizer.model_name(), "summarization model initialized");

    let fetcher = create_fetcher(&FetcherConfig {
        user_agent: cli.user_agent,
        timeout: Duration::from_secs(cli.timeout),
        retries: cli.retries,
        ..FetcherConfig::default()
    })?;

    let mut manager = ScraperManager::new(Arc::clone(&registry), fetcher, storage, summarizer)?;

    match cli.command {
        Commands::Scrape { command } => {
            let args = ScraperArgs {
                command: command.unwrap_or_default(),
            };
            handle_command(args, &mut manager).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["an", "scrape"]);
        assert_eq!(cli.storage, "memory");
        assert_eq!(cli.model, "extractive");
        assert_eq!(cli.log_level, Level::INFO);
        assert_eq!(cli.timeout, 15);
        assert_eq!(cli.model_timeout, 120);
        assert!(cli.model_id.is_none());
        assert!(matches!(cli.command, Commands::Scrape { command: None }));
    }

    #[test]
    fn test_scrape_run_with_filters() {
        let cli = Cli::parse_from([
            "an", "--storage", "sqlite", "--backend-url", "news.db", "--log-level", "debug", "scrape", "run",
            "--category", "AI", "--deadline", "30m",
        ]);
        assert_eq!(cli.backend_url.as_deref(), Some("news.db"));
        assert_eq!(cli.log_level, Level::DEBUG);
        match cli.command {
            Commands::Scrape {
                command: Some(ScraperCommands::Run { categories, deadline, .. }),
            } => {
                assert_eq!(categories, vec!["AI"]);
                assert_eq!(deadline.map(|d| d.0), Some(Duration::from_secs(1800)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_model_flags() {
        let cli = Cli::parse_from([
            "an", "--model", "openai", "--model-id", "gpt-4o", "--model-timeout", "30", "scrape",
        ]);
        assert_eq!(cli.model, "openai");
        assert_eq!(cli.model_id.as_deref(), Some("gpt-4o"));
        assert_eq!(cli.model_timeout, 30);
    }

    #[test]
    fn test_scrape_url() {
        let cli = Cli::parse_from(["an", "scrape", "url", "https://example.com/a"]);
        assert!(matches!(
            cli.command,
            Commands::Scrape { command: Some(ScraperCommands::Url { ref url }) } if url == "https://example.com/a"
        ));
    }
}
