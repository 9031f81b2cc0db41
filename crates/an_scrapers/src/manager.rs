use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use an_core::{
    ArticleRecord, ArticleStorage, ArticleStub, Category, CategoryCode, Error, InsertOutcome,
    NewArticle, ResolvedArticle, Result, SourceConfig,
};
use an_inference::summarizer::{Summarizer, DEFAULT_MAX_LEN, DEFAULT_MIN_LEN};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

use crate::fetcher::Fetcher;
use crate::logging::{article_span, unit_span};
use crate::scrapers::{dates, extract_stubs, ContentResolver, Resolution, DEFAULT_LISTING_LIMIT};
use crate::sources::SourceRegistry;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub listing_limit: usize,
    /// Bound on (category, source) units running at once.
    pub max_concurrent_units: usize,
    /// Bound on articles being resolved and summarized at once, across all units.
    pub max_concurrent_articles: usize,
    pub summary_max_len: usize,
    pub summary_min_len: usize,
    pub deadline: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            listing_limit: DEFAULT_LISTING_LIMIT,
            max_concurrent_units: 4,
            max_concurrent_articles: 2,
            summary_max_len: DEFAULT_MAX_LEN,
            summary_min_len: DEFAULT_MIN_LEN,
            deadline: None,
        }
    }
}

/// Which categories and sources a run covers. Empty lists mean "all".
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    pub categories: Vec<CategoryCode>,
    pub sources: Vec<String>,
}

impl RunPlan {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, code: impl Into<CategoryCode>) -> Self {
        self.categories.push(code.into());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.sources.push(source.to_string());
        self
    }

    fn includes_source(&self, source: &str) -> bool {
        self.sources.is_empty() || self.sources.iter().any(|s| s == source)
    }
}

/// Something that was skipped or failed during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub category: CategoryCode,
    pub source: Option<String>,
    pub url: Option<String>,
    pub reason: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CategoryStats {
    pub added: usize,
    pub skipped_existing: usize,
    pub skipped_unresolved: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Keyed by category name.
    pub stats: BTreeMap<String, CategoryStats>,
    pub records: Vec<ArticleRecord>,
    pub failures: Vec<Failure>,
    pub timed_out: bool,
}

impl RunReport {
    pub fn added(&self) -> usize {
        self.records.len()
    }

    pub fn stats_for(&self, category_name: &str) -> CategoryStats {
        self.stats.get(category_name).cloned().unwrap_or_default()
    }

    fn merge(&mut self, unit: UnitReport) {
        let stats = self.stats.entry(unit.category_name).or_default();
        stats.added += unit.stats.added;
        stats.skipped_existing += unit.stats.skipped_existing;
        stats.skipped_unresolved += unit.stats.skipped_unresolved;
        stats.failed += unit.stats.failed;
        self.records.extend(unit.records);
        self.failures.extend(unit.failures);
        self.timed_out |= unit.timed_out;
    }

    pub fn log_summary(&self, elapsed: Duration) {
        for (category, stats) in &self.stats {
            info!(
                category = %category,
                added = stats.added,
                existing = stats.skipped_existing,
                unresolved = stats.skipped_unresolved,
                failed = stats.failed,
                "category summary"
            );
        }
        for failure in &self.failures {
            debug!(
                category = %failure.category,
                source = failure.source.as_deref().unwrap_or("-"),
                url = failure.url.as_deref().unwrap_or("-"),
                reason = %failure.reason,
                "skipped"
            );
        }
        info!(
            added = self.added(),
            failures = self.failures.len(),
            timed_out = self.timed_out,
            elapsed_ms = elapsed.as_millis() as u64,
            "run complete"
        );
    }
}

struct UnitReport {
    category_name: String,
    category: CategoryCode,
    source: String,
    stats: CategoryStats,
    records: Vec<ArticleRecord>,
    failures: Vec<Failure>,
    timed_out: bool,
}

impl UnitReport {
    fn new(category_name: &str, category: &CategoryCode, source: &str) -> Self {
        Self {
            category_name: category_name.to_string(),
            category: category.clone(),
            source: source.to_string(),
            stats: CategoryStats::default(),
            records: Vec::new(),
            failures: Vec::new(),
            timed_out: false,
        }
    }

    fn fail(&mut self, url: Option<&str>, reason: impl ToString) {
        self.failures.push(Failure {
            category: self.category.clone(),
            source: Some(self.source.clone()),
            url: url.map(str::to_string),
            reason: reason.to_string(),
        });
    }

    fn record(&mut self, stub: &ArticleStub, outcome: Result<StubOutcome>) {
        match outcome {
            Ok(StubOutcome::Added(record)) => {
                self.stats.added += 1;
                self.records.push(record);
            }
            Ok(StubOutcome::Existing) => self.stats.skipped_existing += 1,
            Ok(StubOutcome::Unresolved(e)) => {
                self.stats.skipped_unresolved += 1;
                self.fail(Some(stub.url.as_str()), e);
            }
            Err(e) => {
                error!(
                    article = %stub.title,
                    url = %stub.url,
                    error = %e,
                    "failed to process article"
                );
                self.stats.failed += 1;
                self.fail(Some(stub.url.as_str()), e);
            }
        }
    }
}

/// Units record outcomes as they happen, so one cut off by the deadline still reports what it
/// stored. The guard must never be held across an await.
fn lock(unit: &Mutex<UnitReport>) -> MutexGuard<'_, UnitReport> {
    unit.lock().unwrap_or_else(PoisonError::into_inner)
}

enum StubOutcome {
    Added(ArticleRecord),
    Existing,
    Unresolved(Error),
}

/// Runs categories × sources through fetch, extract, resolve, summarize and store.
pub struct ScraperManager {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn Fetcher>,
    resolver: ContentResolver,
    summarizer: Summarizer,
    storage: Arc<dyn ArticleStorage>,
    config: PipelineConfig,
}

impl ScraperManager {
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn ArticleStorage>,
        summarizer: Summarizer,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            resolver: ContentResolver::standard(fetcher.clone())?,
            fetcher,
            summarizer,
            storage,
            config: PipelineConfig::default(),
        })
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.config
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub async fn run_all(&self) -> Result<RunReport> {
        self.run(&RunPlan::all()).await
    }

    /// Runs the plan to completion.
    ///
    /// Only an unknown source or category in `plan` is returned as an error, and it is
    /// detected before any request is made. Everything else ends up in the report.
    pub async fn run(&self, plan: &RunPlan) -> Result<RunReport> {
        for source in &plan.sources {
            self.registry.config_for(source)?;
        }
        let codes = if plan.categories.is_empty() {
            self.registry.category_codes()
        } else {
            plan.categories.clone()
        };
        for code in &codes {
            self.registry.category_name(code)?;
        }

        let started = Instant::now();
        let deadline = self.config.deadline.map(|d| started + d);
        let unit_permits = Semaphore::new(self.config.max_concurrent_units.max(1));
        let article_permits = Semaphore::new(self.config.max_concurrent_articles.max(1));
        let mut report = RunReport::default();
        let mut units = Vec::new();

        for code in codes {
            let name = self.registry.category_name(&code)?.to_string();
            report.stats.entry(name.clone()).or_default();

            let category = match self.storage.get_or_create_category(&name).await {
                Ok(category) => category,
                Err(e) => {
                    error!(category = %code, error = %e, "could not get or create category");
                    report.failures.push(Failure {
                        category: code.clone(),
                        source: None,
                        url: None,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for source in self.registry.sources_for(&code) {
                if plan.includes_source(&source.id) {
                    units.push((category.clone(), code.clone(), source.id.clone()));
                }
            }
        }

        info!(units = units.len(), "starting run");

        let unit_futures = units.into_iter().map(|(category, code, source)| {
            let span = unit_span(&code, &source);
            let unit_permits = &unit_permits;
            let article_permits = &article_permits;
            async move {
                let unit = Mutex::new(UnitReport::new(&category.name, &code, &source));
                let work = async {
                    match unit_permits.acquire().await {
                        Ok(_permit) => {
                            self.run_unit(&category, &code, &source, article_permits, &unit)
                                .await
                        }
                        Err(e) => lock(&unit).fail(None, e),
                    }
                };

                let finished = match deadline {
                    Some(at) => tokio::time::timeout_at(at, work).await.is_ok(),
                    None => {
                        work.await;
                        true
                    }
                };

                let mut unit = unit.into_inner().unwrap_or_else(PoisonError::into_inner);
                if !finished {
                    warn!(added = unit.stats.added, "run deadline reached, abandoning unit");
                    unit.fail(None, "run deadline exceeded");
                    unit.timed_out = true;
                }
                unit
            }
            .instrument(span)
        });

        for unit in join_all(unit_futures).await {
            report.merge(unit);
        }

        report.log_summary(started.elapsed());
        Ok(report)
    }

    async fn run_unit(
        &self,
        category: &Category,
        code: &CategoryCode,
        source_id: &str,
        article_permits: &Semaphore,
        unit: &Mutex<UnitReport>,
    ) {
        let (config, listing_url) = match self
            .registry
            .config_for(source_id)
            .and_then(|config| Ok((config, self.registry.listing_url(source_id, code)?)))
        {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, "source is misconfigured");
                lock(unit).fail(None, e);
                return;
            }
        };

        let html = match self.fetcher.fetch(&listing_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %listing_url, error = %e, "listing unavailable, skipping source");
                lock(unit).fail(Some(listing_url.as_str()), e);
                return;
            }
        };

        let stubs = match extract_stubs(&html, config, self.config.listing_limit) {
            Ok(stubs) => stubs,
            Err(e) => {
                error!(url = %listing_url, error = %e, "could not extract listing");
                lock(unit).fail(Some(listing_url.as_str()), e);
                return;
            }
        };
        debug!(stubs = stubs.len(), "listing parsed");

        join_all(stubs.iter().map(|stub| {
            async move {
                let outcome = self.process_stub(stub, category, config, article_permits).await;
                lock(unit).record(stub, outcome);
            }
            .instrument(article_span(&stub.title, &stub.url))
        }))
        .await;

        let unit = lock(unit);
        info!(
            added = unit.stats.added,
            existing = unit.stats.skipped_existing,
            unresolved = unit.stats.skipped_unresolved,
            failed = unit.stats.failed,
            "source done"
        );
    }

    async fn process_stub(
        &self,
        stub: &ArticleStub,
        category: &Category,
        config: &SourceConfig,
        article_permits: &Semaphore,
    ) -> Result<StubOutcome> {
        // Known URLs are skipped before paying for resolution and summarization.
        if self.storage.exists_article_with_url(&stub.url).await? {
            debug!("already stored");
            return Ok(StubOutcome::Existing);
        }

        let _permit = article_permits
            .acquire()
            .await
            .map_err(|e| Error::External(e.into()))?;

        let resolved = match self.resolve_stub(stub, config).await {
            Ok(resolved) => resolved,
            Err(e) => return Ok(StubOutcome::Unresolved(e)),
        };
        let summary = self
            .summarizer
            .summarize(&resolved.content, self.config.summary_max_len, self.config.summary_min_len)
            .await;

        let article = NewArticle {
            title: resolved.stub.title,
            url: resolved.stub.url,
            summary,
            category: category.clone(),
            publication_date: resolved.publication_date,
        };

        match self.storage.create_article(article).await? {
            InsertOutcome::Created(record) => {
                info!("article added");
                Ok(StubOutcome::Added(record))
            }
            InsertOutcome::AlreadyExists => {
                debug!("stored concurrently by another unit");
                Ok(StubOutcome::Existing)
            }
        }
    }

    /// Fetches the article page and parses the listing date. Fails only when the page is
    /// unreachable; a page without recognizable content resolves to empty text.
    async fn resolve_stub(
        &self,
        stub: &ArticleStub,
        config: &SourceConfig,
    ) -> Result<ResolvedArticle> {
        let content = match self.resolver.resolve_detailed(&stub.url).await {
            Resolution::Content(text) => text,
            Resolution::Empty => String::new(),
            Resolution::Unreachable(e) => return Err(e),
        };
        Ok(ResolvedArticle {
            stub: stub.clone(),
            content,
            publication_date: dates::parse_date(&stub.raw_date, &config.date_format),
        })
    }

    /// Resolves and summarizes a single article without storing it.
    pub async fn scrape_url(&self, url: &str) -> Result<(String, String)> {
        let content = match self.resolver.resolve_detailed(url).await {
            Resolution::Content(text) => text,
            Resolution::Empty => String::new(),
            Resolution::Unreachable(e) => return Err(e),
        };
        let summary = self
            .summarizer
            .summarize(&content, self.config.summary_max_len, self.config.summary_min_len)
            .await;
        Ok((content, summary))
    }

    pub fn list_sources(&self) -> Result<()> {
        for id in self.registry.source_ids() {
            let config = self.registry.config_for(id)?;
            println!("{} ({})", id, config.base_url);
            for code in self.registry.categories_for(id)? {
                println!("  - {} {}", code, self.registry.category_name(&code)?);
            }
        }
        Ok(())
    }
}
