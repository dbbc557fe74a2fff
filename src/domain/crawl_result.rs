//! Crawl results as folded values
//!
//! Each page step yields a `PageReport`; the engine folds reports into a
//! `CrawlResult` instead of mutating a shared accumulator.

use serde::{Deserialize, Serialize};

use super::deal::{HotDeal, HotDealSource};

/// What happened to one listing row
#[derive(Debug, Clone)]
pub enum PostOutcome {
    Created(HotDeal),
    Updated(HotDeal),
    /// Built but the sink refused or failed the write
    WriteFailed(HotDeal),
    /// Older than the time-window cutoff, not persisted
    Stale,
    /// Could not be turned into a deal
    Failed,
}

/// Why the page loop stopped before `max_pages`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HaltReason {
    EmptyPage,
    NavigationFailed,
    StaleWindow,
}

#[derive(Debug, Clone)]
pub struct PageReport {
    pub page: u32,
    pub outcomes: Vec<PostOutcome>,
    pub page_errors: u32,
    pub halt: Option<HaltReason>,
}

impl PageReport {
    pub const fn empty(page: u32, halt: HaltReason) -> Self {
        Self {
            page,
            outcomes: Vec::new(),
            page_errors: 0,
            halt: Some(halt),
        }
    }

    pub const fn navigation_failed(page: u32) -> Self {
        Self {
            page,
            outcomes: Vec::new(),
            page_errors: 1,
            halt: Some(HaltReason::NavigationFailed),
        }
    }

    /// The listing itself was read, whether or not it yielded posts
    pub const fn loaded(&self) -> bool {
        !matches!(
            self.halt,
            Some(HaltReason::EmptyPage | HaltReason::NavigationFailed)
        )
    }
}

/// Per-source run summary returned to the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub source: HotDealSource,
    pub total_crawled: u32,
    pub new_deals: u32,
    pub updated_deals: u32,
    pub errors: u32,
    pub pages_crawled: u32,
    pub duration_ms: u64,
    pub halted_by: Option<HaltReason>,
    #[serde(default)]
    pub hotdeals: Vec<HotDeal>,
}

impl CrawlResult {
    pub const fn empty(source: HotDealSource) -> Self {
        Self {
            source,
            total_crawled: 0,
            new_deals: 0,
            updated_deals: 0,
            errors: 0,
            pages_crawled: 0,
            duration_ms: 0,
            halted_by: None,
            hotdeals: Vec::new(),
        }
    }

    /// Zero-result placeholder recorded when a source run fails outright
    pub const fn failed(source: HotDealSource, duration_ms: u64) -> Self {
        let mut result = Self::empty(source);
        result.errors = 1;
        result.duration_ms = duration_ms;
        result
    }

    #[must_use]
    pub fn fold_page(mut self, report: PageReport) -> Self {
        if report.loaded() {
            self.pages_crawled += 1;
        }
        self.errors += report.page_errors;
        for outcome in report.outcomes {
            match outcome {
                PostOutcome::Created(deal) => {
                    self.total_crawled += 1;
                    self.new_deals += 1;
                    self.hotdeals.push(deal);
                }
                PostOutcome::Updated(deal) => {
                    self.total_crawled += 1;
                    self.updated_deals += 1;
                    self.hotdeals.push(deal);
                }
                PostOutcome::WriteFailed(deal) => {
                    self.total_crawled += 1;
                    self.errors += 1;
                    self.hotdeals.push(deal);
                }
                PostOutcome::Stale => {}
                PostOutcome::Failed => self.errors += 1,
            }
        }
        if report.halt.is_some() {
            self.halted_by = report.halt;
        }
        self
    }

    pub const fn is_success(&self) -> bool {
        self.errors == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deal::{DealStatus, PriceValue};
    use chrono::Utc;

    fn deal(post_id: &str) -> HotDeal {
        let now = Utc::now();
        HotDeal {
            id: format!("hotdeal_0_{post_id}"),
            source: HotDealSource::Clien,
            source_post_id: post_id.to_string(),
            title: "테스트".into(),
            category: "기타".into(),
            original_price: PriceValue::NotFound,
            sale_price: PriceValue::NotFound,
            discount_rate: 0,
            seller: "클리앙".into(),
            original_url: format!("https://example.com/{post_id}"),
            image_url: None,
            thumbnail_url: None,
            is_free_shipping: false,
            status: DealStatus::Active,
            views: 0,
            like_count: 0,
            comment_count: 0,
            author_name: "익명".into(),
            description: None,
            crawled_at: now,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn folding_counts_each_outcome_kind() {
        let report = PageReport {
            page: 1,
            outcomes: vec![
                PostOutcome::Created(deal("1")),
                PostOutcome::Updated(deal("2")),
                PostOutcome::WriteFailed(deal("3")),
                PostOutcome::Stale,
                PostOutcome::Failed,
            ],
            page_errors: 0,
            halt: None,
        };

        let result = CrawlResult::empty(HotDealSource::Clien).fold_page(report);
        assert_eq!(result.total_crawled, 3);
        assert_eq!(result.new_deals, 1);
        assert_eq!(result.updated_deals, 1);
        assert_eq!(result.errors, 2);
        assert_eq!(result.hotdeals.len(), 3);
        assert_eq!(result.halted_by, None);
        assert_eq!(result.pages_crawled, 1);
    }

    #[test]
    fn navigation_failure_counts_as_error_and_halts() {
        let result = CrawlResult::empty(HotDealSource::Ruliweb)
            .fold_page(PageReport::navigation_failed(1));
        assert_eq!(result.errors, 1);
        assert_eq!(result.halted_by, Some(HaltReason::NavigationFailed));
        assert_eq!(result.pages_crawled, 0);
    }
}
