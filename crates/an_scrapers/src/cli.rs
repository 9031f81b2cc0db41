use std::str::FromStr;
use std::time::Duration;

use an_core::{CategoryCode, Result};
use clap::{Args, Subcommand};
use tracing::info;

use crate::manager::{RunPlan, ScraperManager};

/// A duration written as `1h15m30s`, `30m` or a bare number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_value = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let num = parse_number(&current_number)?;
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|seconds| total_seconds.checked_add(seconds))
                    .ok_or_else(too_large)?;
                current_number.clear();
                has_value = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing number without unit counts as seconds
        if !current_number.is_empty() {
            total_seconds = total_seconds
                .checked_add(parse_number(&current_number)?)
                .ok_or_else(too_large)?;
            has_value = true;
        }

        if !has_value {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

fn parse_number(digits: &str) -> std::result::Result<u64, String> {
    digits.parse::<u64>().map_err(|_| too_large())
}

fn too_large() -> String {
    "Duration too large".to_string()
}

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Scrape every configured (category, source) pair and store new articles
    Run {
        /// Only these category codes (e.g. AI, CYB). Repeatable.
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Only these sources (e.g. techcrunch). Repeatable.
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Articles taken from each listing page
        #[arg(long)]
        limit: Option<usize>,
        /// (category, source) pairs processed at once
        #[arg(long)]
        workers: Option<usize>,
        /// Articles resolved and summarized at once
        #[arg(long)]
        article_workers: Option<usize>,
        /// Stop waiting for unfinished sources after this long (e.g. 30m)
        #[arg(long)]
        deadline: Option<HumanDuration>,
    },
    /// List configured sources and their categories
    List,
    /// Resolve and summarize a single article URL without storing it
    Url { url: String },
}

impl Default for ScraperCommands {
    fn default() -> Self {
        ScraperCommands::Run {
            categories: Vec::new(),
            sources: Vec::new(),
            limit: None,
            workers: None,
            article_workers: None,
            deadline: None,
        }
    }
}

pub async fn handle_command(args: ScraperArgs, manager: &mut ScraperManager) -> Result<()> {
    match args.command {
        ScraperCommands::Run {
            categories,
            sources,
            limit,
            workers,
            article_workers,
            deadline,
        } => {
            let config = manager.config_mut();
            if let Some(limit) = limit {
                config.listing_limit = limit;
            }
            if let Some(workers) = workers {
                config.max_concurrent_units = workers;
            }
            if let Some(article_workers) = article_workers {
                config.max_concurrent_articles = article_workers;
            }
            if let Some(deadline) = deadline {
                config.deadline = Some(deadline.0);
            }

            let plan = RunPlan {
                categories: categories.iter().map(|c| CategoryCode::new(c)).collect(),
                sources,
            };
            info!(
                categories = plan.categories.len(),
                sources = plan.sources.len(),
                "scraping articles"
            );

            let report = manager.run(&plan).await?;
            for record in &report.records {
                println!("+ [{}] {} - {}", record.category.name, record.title, record.url);
            }
            println!(
                "{} new articles, {} skipped or failed{}",
                report.added(),
                report.failures.len(),
                if report.timed_out { " (deadline reached)" } else { "" }
            );
        }
        ScraperCommands::List => manager.list_sources()?,
        ScraperCommands::Url { url } => {
            info!(url = %url, "scraping single url");
            let (content, summary) = manager.scrape_url(&url).await?;
            println!("Content: {} chars", content.chars().count());
            println!("Summary: {}", summary);
        }
    }
    Ok(())
}
