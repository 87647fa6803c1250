use std::time::Duration;

use url::Url;

use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{ScrapedStory, StoryCandidate};
use crate::scheduler::CategoryScheduler;
use crate::services::{parse_listing, RenderClient, SynopsisFetcher, INDEX_ROW_SELECTOR};

/// One-invocation orchestrator: picks the next category, scrapes its index
/// page, fetches missing synopses sequentially and persists them in
/// batches, then advances the rotation pointer.
///
/// The runner does not guard against a second invocation overlapping a
/// long-running one; the host scheduler's interval is expected to exceed a
/// pass's duration.
pub struct ScrapeRunner {
    repository: Repository,
    provider: RenderClient,
    scheduler: CategoryScheduler,
    fetch_delay: Duration,
    batch_size: usize,
}

impl ScrapeRunner {
    pub async fn new(config: &Config) -> Result<Self> {
        config.validate_for_scrape()?;
        let account_id = config
            .cloudflare_account_id
            .clone()
            .ok_or_else(|| AppError::Config("cloudflare_account_id must be set".to_string()))?;
        let api_token = config
            .cloudflare_api_token
            .clone()
            .ok_or_else(|| AppError::Config("cloudflare_api_token must be set".to_string()))?;

        let repository = Repository::new(&config.db_path).await?;
        let provider = RenderClient::new(&account_id, api_token);
        let scheduler = CategoryScheduler::new(config.categories.clone());

        Ok(Self {
            repository,
            provider,
            scheduler,
            fetch_delay: Duration::from_secs(config.fetch_delay_secs),
            batch_size: config.batch_size,
        })
    }

    /// Run one ingestion pass. Failures are contained here: they are
    /// logged, the rotation pointer stays put, and the next scheduled
    /// invocation retries the same category.
    pub async fn run(&self) {
        if let Err(e) = self.run_pass().await {
            tracing::error!("Scrape pass failed: {}", e);
        }
    }

    async fn run_pass(&self) -> Result<()> {
        let (index, category) = self.scheduler.next(&self.repository).await?;
        tracing::info!(
            "Starting scrape for category #{}: [{}]",
            index,
            category.key.to_uppercase()
        );

        let base_url = Url::parse(&category.url).map_err(|e| {
            AppError::Config(format!("invalid index URL for {}: {}", category.key, e))
        })?;
        let fragments = self
            .provider
            .scrape(&category.url, &[INDEX_ROW_SELECTOR])
            .await?;
        let candidates = parse_listing(&fragments, &base_url);

        let already_scraped = self.repository.urls_with_synopsis().await?;
        let found = candidates.len();
        let to_scrape: Vec<StoryCandidate> = candidates
            .into_iter()
            .filter(|candidate| !already_scraped.contains(&candidate.url))
            .collect();
        tracing::info!(
            "Index page has {} stories; {} new synopses to fetch",
            found,
            to_scrape.len()
        );

        self.ingest_candidates(index, to_scrape).await
    }

    /// Synopsis loop and batched persistence for one category pass. The
    /// pointer advances only after every batch has committed — or right
    /// away when there is nothing to do, so a quiet category never stalls
    /// the rotation.
    async fn ingest_candidates(
        &self,
        index: usize,
        candidates: Vec<StoryCandidate>,
    ) -> Result<()> {
        if candidates.is_empty() {
            tracing::info!("No new stories in this category; moving rotation along");
            self.scheduler.advance(&self.repository, index).await?;
            return Ok(());
        }

        let fetcher = SynopsisFetcher::new(&self.provider, self.fetch_delay);
        let mut sink = BatchSink::new(&self.repository, self.batch_size);
        let total = candidates.len();

        for (position, candidate) in candidates.into_iter().enumerate() {
            tracing::info!(
                "Fetching synopsis {}/{}: {}",
                position + 1,
                total,
                candidate.title
            );
            let synopsis = fetcher.fetch(&candidate.url).await;
            if let Some(saved) = sink.push(ScrapedStory::from_candidate(candidate, synopsis)).await? {
                tracing::info!("Saved batch of {} stories", saved);
            }
        }
        if let Some(saved) = sink.finish().await? {
            tracing::info!("Saved final batch of {} stories", saved);
        }

        self.scheduler.advance(&self.repository, index).await?;
        tracing::info!("Category pass complete");
        Ok(())
    }
}

/// Accumulates completed stories and commits them through
/// `Repository::upsert_batch` whenever the batch-size threshold is
/// reached, plus one final flush for the remainder.
struct BatchSink<'a> {
    repository: &'a Repository,
    batch_size: usize,
    batch: Vec<ScrapedStory>,
}

impl<'a> BatchSink<'a> {
    fn new(repository: &'a Repository, batch_size: usize) -> Self {
        Self {
            repository,
            batch_size,
            batch: Vec::with_capacity(batch_size),
        }
    }

    /// Returns the committed batch size when this push triggered a flush.
    async fn push(&mut self, story: ScrapedStory) -> Result<Option<usize>> {
        self.batch.push(story);
        if self.batch.len() >= self.batch_size {
            self.flush().await
        } else {
            Ok(None)
        }
    }

    async fn finish(mut self) -> Result<Option<usize>> {
        self.flush().await
    }

    async fn flush(&mut self) -> Result<Option<usize>> {
        if self.batch.is_empty() {
            return Ok(None);
        }
        let size = self.batch.len();
        self.repository
            .upsert_batch(std::mem::take(&mut self.batch))
            .await?;
        Ok(Some(size))
    }
}
