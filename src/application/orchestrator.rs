//! 크롤링 오케스트레이터
//!
//! Runs the requested sources one after another with a politeness delay in
//! between. A source whose session cannot be opened is retried as a whole,
//! then recorded as a zero-result placeholder; the remaining sources still
//! run. Cancellation is observed only between sources.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::crawling::SourceCrawler;
use crate::domain::crawl_result::CrawlResult;
use crate::domain::deal::{HotDeal, HotDealSource};
use crate::domain::options::CrawlerOptions;
use crate::domain::repositories::HotDealRepository;
use crate::domain::statistics::DealStatistics;
use crate::infrastructure::browser::BrowserLauncher;
use crate::infrastructure::config::{ConfigManager, CrawlerSettings, StorageConfig};
use crate::infrastructure::error::CrawlerError;
use crate::infrastructure::json_export::export_deals;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub source_delay: Duration,
    /// Extra attempts after the first failed one
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub export_dir: Option<PathBuf>,
}

impl OrchestratorSettings {
    pub fn from_config(crawler: &CrawlerSettings, storage: &StorageConfig) -> Self {
        Self {
            source_delay: Duration::from_millis(crawler.source_delay_ms),
            retry_attempts: crawler.source_retry_attempts,
            retry_delay: Duration::from_millis(crawler.source_retry_delay_ms),
            export_dir: if storage.export_after_run {
                Self::export_dir_or_default(storage)
            } else {
                None
            },
        }
    }

    fn export_dir_or_default(storage: &StorageConfig) -> Option<PathBuf> {
        if let Some(dir) = &storage.export_dir {
            return Some(dir.clone());
        }
        match ConfigManager::default_export_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!("⚠️ No export directory configured and none available: {}", e);
                None
            }
        }
    }

    /// No delays, no retries
    pub const fn immediate() -> Self {
        Self {
            source_delay: Duration::ZERO,
            retry_attempts: 0,
            retry_delay: Duration::ZERO,
            export_dir: None,
        }
    }

    #[must_use]
    pub fn with_export_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.export_dir = dir;
        self
    }

    #[must_use]
    pub const fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }
}

/// Aggregate of one multi-source run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorReport {
    pub run_id: String,
    pub results: Vec<CrawlResult>,
    pub total_crawled: u32,
    pub new_deals: u32,
    pub updated_deals: u32,
    pub errors: u32,
    pub statistics: DealStatistics,
    /// Sources that produced a placeholder, with the last error
    pub failures: BTreeMap<HotDealSource, String>,
    pub duration_ms: u64,
    pub export_path: Option<PathBuf>,
    /// Sources skipped because of a shutdown request
    pub skipped: Vec<HotDealSource>,
}

impl OrchestratorReport {
    fn from_results(
        run_id: String,
        results: Vec<CrawlResult>,
        failures: BTreeMap<HotDealSource, String>,
        skipped: Vec<HotDealSource>,
        duration_ms: u64,
    ) -> Self {
        let statistics = results
            .iter()
            .map(|result| DealStatistics::from_deals(&result.hotdeals))
            .fold(DealStatistics::default(), |acc, stats| acc.combine(&stats));

        Self {
            run_id,
            total_crawled: results.iter().map(|r| r.total_crawled).sum(),
            new_deals: results.iter().map(|r| r.new_deals).sum(),
            updated_deals: results.iter().map(|r| r.updated_deals).sum(),
            errors: results.iter().map(|r| r.errors).sum(),
            results,
            statistics,
            failures,
            duration_ms,
            export_path: None,
            skipped,
        }
    }

    pub fn all_deals(&self) -> impl Iterator<Item = &HotDeal> {
        self.results.iter().flat_map(|result| result.hotdeals.iter())
    }

    pub fn pages_crawled(&self) -> u32 {
        self.results.iter().map(|r| r.pages_crawled).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct CrawlOrchestrator {
    launcher: Arc<dyn BrowserLauncher>,
    repository: Arc<dyn HotDealRepository>,
    settings: OrchestratorSettings,
    cancel: CancellationToken,
}

impl CrawlOrchestrator {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        repository: Arc<dyn HotDealRepository>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            launcher,
            repository,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Cancelling it stops the run before the next source starts
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(
        &self,
        sources: &[HotDealSource],
        options: &CrawlerOptions,
    ) -> OrchestratorReport {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("crawl_run", run_id = %run_id);
        self.run_sources(run_id, sources, options).instrument(span).await
    }

    async fn run_sources(
        &self,
        run_id: String,
        sources: &[HotDealSource],
        options: &CrawlerOptions,
    ) -> OrchestratorReport {
        let started = Instant::now();
        info!("🚀 Crawling {} source(s): {:?}", sources.len(), sources);

        let mut results = Vec::with_capacity(sources.len());
        let mut failures = BTreeMap::new();
        let mut skipped = Vec::new();

        for (index, &source) in sources.iter().enumerate() {
            if index > 0 && !self.pause(self.settings.source_delay).await {
                skipped.extend_from_slice(&sources[index..]);
                break;
            }
            if self.cancel.is_cancelled() {
                skipped.extend_from_slice(&sources[index..]);
                break;
            }

            let attempt_started = Instant::now();
            match self.run_source(source, options).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!("❌ {} failed: {}", source.display_name(), e);
                    failures.insert(source, e.to_string());
                    results.push(CrawlResult::failed(
                        source,
                        attempt_started.elapsed().as_millis() as u64,
                    ));
                }
            }
        }

        if !skipped.is_empty() {
            warn!("⏹️ Shutdown requested, skipped: {:?}", skipped);
        }

        let mut report = OrchestratorReport::from_results(
            run_id,
            results,
            failures,
            skipped,
            started.elapsed().as_millis() as u64,
        );
        report.export_path = self.export(sources, &report).await;

        info!(
            "🎉 Run finished: {} crawled ({} new, {} updated), {} errors, {} failed sources in {}ms",
            report.total_crawled,
            report.new_deals,
            report.updated_deals,
            report.errors,
            report.failures.len(),
            report.duration_ms
        );
        report
    }

    async fn run_source(
        &self,
        source: HotDealSource,
        options: &CrawlerOptions,
    ) -> Result<CrawlResult, CrawlerError> {
        let crawler = SourceCrawler::for_source(
            source,
            Arc::clone(&self.launcher),
            Arc::clone(&self.repository),
        )?;

        let attempts = self.settings.retry_attempts + 1;
        let mut attempt = 1;
        loop {
            match crawler.crawl(options).await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < attempts && !self.cancel.is_cancelled() => {
                    let delay = e
                        .retry_delay_ms()
                        .map_or(self.settings.retry_delay, Duration::from_millis)
                        .max(self.settings.retry_delay);
                    warn!(
                        "🔄 {} attempt {}/{} failed ({}), retrying in {:?}",
                        source.display_name(),
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    if !self.pause(delay).await {
                        return Err(e);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sleep unless cancelled first; `false` when cancelled
    async fn pause(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    async fn export(
        &self,
        sources: &[HotDealSource],
        report: &OrchestratorReport,
    ) -> Option<PathBuf> {
        let dir = self.settings.export_dir.as_ref()?;
        let deals: Vec<HotDeal> = report.all_deals().cloned().collect();
        let label = match sources {
            [single] => Some(*single),
            _ => None,
        };
        match export_deals(dir, label, &deals, Some(report.pages_crawled())).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("⚠️ Export failed: {}", e);
                None
            }
        }
    }
}
