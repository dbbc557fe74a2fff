//! Bounded navigation retry
//!
//! A policy is an ordered list of attempts, each with its own wait condition
//! and timeout. Between attempts the policy sleeps with exponential backoff
//! plus jitter. The listing default is strict-then-loose: DOM loaded within
//! the navigation timeout, then full load with a shorter budget.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::options::CrawlerOptions;
use crate::infrastructure::browser::{PageDriver, WaitCondition};
use crate::infrastructure::config::defaults;
use crate::infrastructure::error::{CrawlerError, CrawlerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStep {
    pub wait: WaitCondition,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    steps: Vec<RetryStep>,
    base_backoff: Duration,
    max_backoff: Duration,
    jitter: bool,
}

impl RetryPolicy {
    pub fn new(steps: Vec<RetryStep>) -> Self {
        Self {
            steps,
            base_backoff: Duration::from_millis(defaults::RETRY_BASE_BACKOFF_MS),
            max_backoff: Duration::from_millis(defaults::RETRY_MAX_BACKOFF_MS),
            jitter: true,
        }
    }

    /// One attempt, no retry
    pub fn single(wait: WaitCondition, timeout: Duration) -> Self {
        Self::new(vec![RetryStep { wait, timeout }])
    }

    /// Listing pages: DOM loaded first, then a looser full-load attempt
    /// that never gets more time than the first one
    pub fn listing(options: &CrawlerOptions) -> Self {
        let strict = options.navigation_timeout();
        let loose = Duration::from_millis(defaults::LOOSE_NAVIGATION_TIMEOUT_MS).min(strict);
        Self::new(vec![
            RetryStep {
                wait: WaitCondition::DomContentLoaded,
                timeout: strict,
            },
            RetryStep {
                wait: WaitCondition::Load,
                timeout: loose,
            },
        ])
    }

    /// Detail pages are optional enrichment: one short attempt
    pub fn detail(options: &CrawlerOptions) -> Self {
        Self::single(WaitCondition::DomContentLoaded, options.detail_timeout())
    }

    #[must_use]
    pub const fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    /// Sleep before retry number `retry` (1-based): base × 2^(retry-1), capped
    pub fn backoff(&self, retry: u32) -> Duration {
        let base_ms = self.base_backoff.as_millis() as u64;
        let exponential = base_ms.saturating_mul(1_u64 << retry.saturating_sub(1).min(16));
        let jitter = if self.jitter && base_ms > 0 {
            fastrand::u64(0..=base_ms / 2)
        } else {
            0
        };
        Duration::from_millis(exponential.saturating_add(jitter))
            .min(self.max_backoff)
    }

    fn delay_before(&self, retry: u32, last_error: Option<&CrawlerError>) -> Duration {
        let hinted = last_error
            .and_then(CrawlerError::retry_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or_default();
        self.backoff(retry).max(hinted)
    }

    /// Run `operation` once per step until it succeeds or a non-recoverable
    /// error comes back. The last error is returned when every step fails.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> CrawlerResult<T>
    where
        F: FnMut(RetryStep) -> Fut,
        Fut: Future<Output = CrawlerResult<T>>,
    {
        let mut last_error: Option<CrawlerError> = None;
        for (index, step) in self.steps.iter().enumerate() {
            if index > 0 {
                let delay = self.delay_before(index as u32, last_error.as_ref());
                debug!("🔄 Retrying {} in {:?} ({:?})", label, delay, step.wait);
                tokio::time::sleep(delay).await;
            }
            match operation(*step).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_recoverable() => {
                    warn!("⚠️ {} attempt {}/{} failed: {}", label, index + 1, self.steps.len(), e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| CrawlerError::navigation(label, "no attempts configured")))
    }

    /// Navigate `driver` to `url`, stepping through the policy
    pub async fn navigate(&self, driver: &mut dyn PageDriver, url: &str) -> CrawlerResult<()> {
        let driver = &Mutex::new(driver);
        self.run(url, move |step| async move {
            driver.lock().await.goto(url, step.wait, step.timeout).await
        })
        .await
    }
}
