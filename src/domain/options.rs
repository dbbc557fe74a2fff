//! Run options for a single source crawl

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::config::defaults;

/// `(current, total_estimate, message)`; the estimate is a moving projection
pub type ProgressCallback = Arc<dyn Fn(u32, u32, &str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: defaults::VIEWPORT_WIDTH,
            height: defaults::VIEWPORT_HEIGHT,
        }
    }
}

/// Immutable for the lifetime of one `crawl()` call
#[derive(Clone)]
pub struct CrawlerOptions {
    pub headless: bool,
    pub max_pages: u32,
    /// Delay between listing pages
    pub delay_ms: u64,
    /// Listing navigation timeout
    pub timeout_ms: u64,
    pub viewport: Viewport,
    pub user_agent: String,
    /// `None` bounds the run by `max_pages` only
    pub time_filter_hours: Option<u32>,
    pub skip_detail: bool,
    pub post_delay_ms: u64,
    pub detail_timeout_ms: u64,
    pub on_progress: Option<ProgressCallback>,
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            headless: true,
            max_pages: defaults::MAX_PAGES,
            delay_ms: defaults::PAGE_DELAY_MS,
            timeout_ms: defaults::NAVIGATION_TIMEOUT_MS,
            viewport: Viewport::default(),
            user_agent: defaults::USER_AGENT.to_string(),
            time_filter_hours: None,
            skip_detail: false,
            post_delay_ms: defaults::POST_DELAY_MS,
            detail_timeout_ms: defaults::DETAIL_TIMEOUT_MS,
            on_progress: None,
        }
    }
}

impl fmt::Debug for CrawlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlerOptions")
            .field("headless", &self.headless)
            .field("max_pages", &self.max_pages)
            .field("delay_ms", &self.delay_ms)
            .field("timeout_ms", &self.timeout_ms)
            .field("viewport", &self.viewport)
            .field("user_agent", &self.user_agent)
            .field("time_filter_hours", &self.time_filter_hours)
            .field("skip_detail", &self.skip_detail)
            .field("post_delay_ms", &self.post_delay_ms)
            .field("detail_timeout_ms", &self.detail_timeout_ms)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "Fn"))
            .finish()
    }
}

impl CrawlerOptions {
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    #[must_use]
    pub const fn with_time_filter(mut self, hours: Option<u32>) -> Self {
        self.time_filter_hours = hours;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Zero every politeness delay; used by offline replays and tests
    #[must_use]
    pub const fn without_delays(mut self) -> Self {
        self.delay_ms = 0;
        self.post_delay_ms = 0;
        self
    }

    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub const fn detail_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_timeout_ms)
    }

    /// Posts older than this instant are out of scope for the run
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.time_filter_hours
            .map(|hours| now - ChronoDuration::hours(i64::from(hours)))
    }

    pub fn report_progress(&self, current: u32, total: u32, message: &str) {
        if let Some(callback) = &self.on_progress {
            callback(current, total, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_absent_without_time_filter() {
        let options = CrawlerOptions::default();
        assert!(options.cutoff(Utc::now()).is_none());
    }

    #[test]
    fn cutoff_subtracts_filter_hours() {
        let now = Utc::now();
        let options = CrawlerOptions::default().with_time_filter(Some(24));
        assert_eq!(options.cutoff(now), Some(now - ChronoDuration::hours(24)));
    }

    #[test]
    fn max_pages_never_drops_below_one() {
        assert_eq!(CrawlerOptions::default().with_max_pages(0).max_pages, 1);
    }
}
