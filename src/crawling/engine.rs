//! Shared per-source crawl engine
//!
//! One `SourceCrawler` per board. A crawl opens one page session, walks the
//! listing pages in ascending order, and folds one `PageReport` per page
//! into the `CrawlResult`. Only a failed session launch escapes `crawl()`;
//! page and post failures are counted and absorbed.

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

use super::detail::DetailFetcher;
use super::source_config::{SourceConfig, config_for};
use super::strategy::build_deal;
use super::time_window::{TimeWindow, WindowDecision};
use crate::domain::crawl_result::{CrawlResult, HaltReason, PageReport, PostOutcome};
use crate::domain::deal::{HotDeal, HotDealSource};
use crate::domain::listing::DetailEnrichment;
use crate::domain::options::CrawlerOptions;
use crate::domain::repositories::{HotDealRepository, SaveOutcome, save_by_natural_key};
use crate::infrastructure::browser::{BrowserLauncher, PageDriver};
use crate::infrastructure::config::defaults;
use crate::infrastructure::error::CrawlerResult;
use crate::infrastructure::extraction::{DetailExtractor, ListingExtractor};
use crate::infrastructure::retry::RetryPolicy;

pub struct SourceCrawler {
    config: SourceConfig,
    base: Url,
    listing: ListingExtractor,
    detail: DetailExtractor,
    launcher: Arc<dyn BrowserLauncher>,
    repository: Arc<dyn HotDealRepository>,
    backoff: Option<(Duration, Duration)>,
}

/// Mutable state of one crawl, owned by that call
struct RunState {
    window: TimeWindow,
    processed: u32,
    rows_seen: u32,
}

impl SourceCrawler {
    /// Compiles the config's selector tables up front
    pub fn new(
        config: SourceConfig,
        launcher: Arc<dyn BrowserLauncher>,
        repository: Arc<dyn HotDealRepository>,
    ) -> CrawlerResult<Self> {
        Ok(Self {
            base: config.base()?,
            listing: ListingExtractor::compile(&config.listing)?,
            detail: DetailExtractor::compile(&config.detail)?,
            config,
            launcher,
            repository,
            backoff: None,
        })
    }

    pub fn for_source(
        source: HotDealSource,
        launcher: Arc<dyn BrowserLauncher>,
        repository: Arc<dyn HotDealRepository>,
    ) -> CrawlerResult<Self> {
        Self::new(config_for(source), launcher, repository)
    }

    /// Override the navigation retry backoff
    #[must_use]
    pub const fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff = Some((base, max));
        self
    }

    pub const fn source(&self) -> HotDealSource {
        self.config.source
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn policy(&self, policy: RetryPolicy) -> RetryPolicy {
        match self.backoff {
            Some((base, max)) => policy.with_backoff(base, max),
            None => policy,
        }
    }

    /// Crawl up to `options.max_pages` listing pages.
    ///
    /// Fails only when the page session cannot be opened. The session is
    /// always closed before returning.
    pub async fn crawl(&self, options: &CrawlerOptions) -> CrawlerResult<CrawlResult> {
        let started = Instant::now();
        let source = self.config.source;
        info!(
            "🚀 Starting {} crawl via {} (max {} pages, time filter: {:?}h)",
            source.display_name(),
            self.launcher.name(),
            options.max_pages,
            options.time_filter_hours
        );

        let mut driver = self.launcher.open(options).await?;
        let mut result = self.run_pages(driver.as_mut(), options).await;
        driver.close().await;

        result.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "✅ {} done: {} crawled ({} new, {} updated), {} errors, {} pages in {}ms",
            source.display_name(),
            result.total_crawled,
            result.new_deals,
            result.updated_deals,
            result.errors,
            result.pages_crawled,
            result.duration_ms
        );
        Ok(result)
    }

    async fn run_pages(
        &self,
        driver: &mut dyn PageDriver,
        options: &CrawlerOptions,
    ) -> CrawlResult {
        let mut result = CrawlResult::empty(self.config.source);
        let mut state = RunState {
            window: TimeWindow::from_options(options, Utc::now()),
            processed: 0,
            rows_seen: 0,
        };
        let max_pages = options.max_pages.max(1);
        options.report_progress(
            0,
            max_pages * defaults::POSTS_PER_PAGE_ESTIMATE,
            &format!("{} 크롤링 시작", self.config.source.display_name()),
        );

        for page in 1..=max_pages {
            let report = self.crawl_page(driver, page, options, &mut state).await;
            let halt = report.halt;
            result = result.fold_page(report);

            if let Some(reason) = halt {
                match reason {
                    HaltReason::StaleWindow => {
                        info!("⏹️ Reached already-seen posts on page {}, stopping", page)
                    }
                    HaltReason::EmptyPage => info!("No more posts on page {}, stopping", page),
                    HaltReason::NavigationFailed => {
                        warn!("⚠️ Stopping after navigation failure on page {}", page)
                    }
                }
                break;
            }
            if page < max_pages && options.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(options.delay_ms)).await;
            }
        }
        result
    }

    /// Rough total for progress reports, refined as pages come in
    fn estimate_total(state: &RunState, page: u32, rows_on_page: u32, max_pages: u32) -> u32 {
        let per_page = (state.rows_seen / page.max(1)).max(1);
        let remaining_pages = max_pages.saturating_sub(page);
        (state.rows_seen + per_page * remaining_pages)
            .max(state.processed)
            .max(rows_on_page)
    }

    async fn crawl_page(
        &self,
        driver: &mut dyn PageDriver,
        page: u32,
        options: &CrawlerOptions,
        state: &mut RunState,
    ) -> PageReport {
        let url = self.config.listing_url(page);
        debug!("📄 Loading listing page {}: {}", page, url);

        let listing_policy = self.policy(RetryPolicy::listing(options));
        if let Err(e) = listing_policy.navigate(driver, &url).await {
            error!("❌ Listing page {} failed: {}", page, e);
            return PageReport::navigation_failed(page);
        }

        let wait = Duration::from_millis(defaults::LIST_WAIT_TIMEOUT_MS);
        if !driver.wait_for_selector(&self.config.list_wait_selector, wait).await {
            warn!(
                "⚠️ List container '{}' not found on page {}",
                self.config.list_wait_selector, page
            );
            return PageReport::empty(page, HaltReason::EmptyPage);
        }

        let html = match driver.content().await {
            Ok(html) => html,
            Err(e) => {
                error!("❌ Could not read listing page {}: {}", page, e);
                return PageReport::navigation_failed(page);
            }
        };

        let items = self.listing.extract(&html, &self.base);
        if items.is_empty() {
            return PageReport::empty(page, HaltReason::EmptyPage);
        }
        let rows_on_page = items.len() as u32;
        state.rows_seen += rows_on_page;
        info!("📋 Page {}: {} posts", page, rows_on_page);

        let detail_policy = self.policy(RetryPolicy::detail(options));
        let fetcher = DetailFetcher::new(
            &self.detail,
            detail_policy,
            self.config.detail_wait_selector.as_deref(),
            &self.base,
        );

        let mut outcomes = Vec::with_capacity(items.len());
        let mut halt = None;
        for item in &items {
            let now = Utc::now();
            let detail = if options.skip_detail {
                DetailEnrichment::empty()
            } else {
                fetcher
                    .fetch(driver, &item.url, item.thumbnail.as_deref(), now)
                    .await
            };

            state.processed += 1;
            let total = Self::estimate_total(state, page, rows_on_page, options.max_pages);

            let Some(deal) = build_deal(&self.config, item, &detail, now) else {
                warn!("⚠️ Skipping post {}: empty title", item.source_post_id);
                outcomes.push(PostOutcome::Failed);
                continue;
            };

            match state.window.observe(deal.created_at) {
                WindowDecision::Keep => {
                    let message = format!("{}: {}", self.config.source, deal.title);
                    outcomes.push(self.persist(deal).await);
                    options.report_progress(state.processed, total, &message);
                }
                WindowDecision::Skip => {
                    debug!("Post {} is older than the cutoff", item.source_post_id);
                    outcomes.push(PostOutcome::Stale);
                }
                WindowDecision::Stop => {
                    outcomes.push(PostOutcome::Stale);
                    halt = Some(HaltReason::StaleWindow);
                    break;
                }
            }

            if options.post_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(options.post_delay_ms)).await;
            }
        }

        PageReport {
            page,
            outcomes,
            page_errors: 0,
            halt,
        }
    }

    async fn persist(&self, deal: HotDeal) -> PostOutcome {
        match save_by_natural_key(self.repository.as_ref(), &deal).await {
            SaveOutcome::Created(saved) => PostOutcome::Created(saved),
            SaveOutcome::Updated(saved) => PostOutcome::Updated(saved),
            SaveOutcome::Rejected => PostOutcome::WriteFailed(deal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::browser::FixtureLauncher;
    use crate::infrastructure::memory_repository::InMemoryHotDealRepository;
    use std::sync::Mutex;

    const LIST: &str = "https://eomisae.co.kr/fs?page=1";

    fn card(id: u32, title: &str) -> String {
        format!(
            r#"<div class="card_el n_ntc">
                 <h3><a class="pjax" href="/fs/{id}">{title}</a></h3>
                 <p><span class="cate">패션,</span><span>방금</span></p>
               </div>"#
        )
    }

    fn crawler(launcher: FixtureLauncher) -> SourceCrawler {
        SourceCrawler::for_source(
            HotDealSource::Eomisae,
            Arc::new(launcher),
            Arc::new(InMemoryHotDealRepository::new()),
        )
        .unwrap()
        .with_backoff(Duration::ZERO, Duration::ZERO)
    }

    fn options() -> CrawlerOptions {
        CrawlerOptions {
            skip_detail: true,
            ..CrawlerOptions::default()
        }
        .without_delays()
        .with_max_pages(1)
    }

    #[tokio::test]
    async fn blank_titles_count_as_errors_and_progress_is_reported() {
        let html = format!("<div id='list'>{}{}</div>", card(1, "운동화 특가"), card(2, "[7]"));
        let launcher = FixtureLauncher::new().with_html(LIST, html);
        let calls: Arc<Mutex<Vec<(u32, u32)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        let options = options().with_progress(Arc::new(move |current: u32, total: u32, _msg: &str| {
            if let Ok(mut seen) = seen.lock() {
                seen.push((current, total));
            }
        }));

        let result = crawler(launcher.clone()).crawl(&options).await.unwrap();
        assert_eq!(result.total_crawled, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(result.pages_crawled, 1);
        assert_eq!(launcher.sessions_closed(), 1);
        assert_eq!(*calls.lock().unwrap(), vec![(0, 20), (1, 2)]);
    }

    #[tokio::test]
    async fn missing_list_container_ends_without_error() {
        let launcher = FixtureLauncher::new().with_html(LIST, "<html><body>점검 중</body></html>");
        let result = crawler(launcher).crawl(&options()).await.unwrap();
        assert_eq!(result.errors, 0);
        assert_eq!(result.pages_crawled, 0);
        assert_eq!(result.halted_by, Some(HaltReason::EmptyPage));
    }

    #[tokio::test]
    async fn launch_failure_is_the_only_error_returned() {
        let launcher = FixtureLauncher::new().failing_launch();
        assert!(crawler(launcher).crawl(&options()).await.is_err());
    }
}
