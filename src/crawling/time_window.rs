//! Incremental time window
//!
//! Posts arrive newest first. Each post older than the cutoff bumps a
//! consecutive-stale counter and is not persisted; a fresh post resets it.
//! Once the counter reaches the threshold the rest of the board is assumed
//! to be stale and paging stops. Without a cutoff the window keeps
//! everything.
//!
//! A timestamp that failed to parse resolves to "now" upstream, so such a
//! post always looks fresh and resets the counter.

use chrono::{DateTime, Utc};

use crate::domain::options::CrawlerOptions;
use crate::infrastructure::config::defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// In the window: persist it
    Keep,
    /// Older than the cutoff: drop it, keep paging
    Skip,
    /// Older than the cutoff and the stale run is long enough: stop paging
    Stop,
}

#[derive(Debug, Clone)]
pub struct TimeWindow {
    cutoff: Option<DateTime<Utc>>,
    threshold: u32,
    consecutive_stale: u32,
}

impl TimeWindow {
    pub fn new(cutoff: Option<DateTime<Utc>>, threshold: u32) -> Self {
        Self {
            cutoff,
            threshold: threshold.max(1),
            consecutive_stale: 0,
        }
    }

    pub fn from_options(options: &CrawlerOptions, now: DateTime<Utc>) -> Self {
        Self::new(options.cutoff(now), defaults::STALE_POST_THRESHOLD)
    }

    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.cutoff
    }

    pub const fn consecutive_stale(&self) -> u32 {
        self.consecutive_stale
    }

    pub fn observe(&mut self, posted_at: DateTime<Utc>) -> WindowDecision {
        let Some(cutoff) = self.cutoff else {
            return WindowDecision::Keep;
        };
        if posted_at >= cutoff {
            self.consecutive_stale = 0;
            return WindowDecision::Keep;
        }
        self.consecutive_stale += 1;
        if self.consecutive_stale >= self.threshold {
            WindowDecision::Stop
        } else {
            WindowDecision::Skip
        }
    }
}
