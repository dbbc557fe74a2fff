//! Domain module - hot-deal records, run options and the sink interface
//!
//! Everything here is plain data or a trait seam; no I/O happens in this layer.

pub mod crawl_result;
pub mod deal;
pub mod listing;
pub mod options;
pub mod repositories;
pub mod statistics;

pub use crawl_result::{CrawlResult, HaltReason, PageReport, PostOutcome};
pub use deal::{DealPatch, DealStatus, HotDeal, HotDealSource, PriceValue};
pub use listing::{DetailEnrichment, RawListItem};
pub use options::{CrawlerOptions, ProgressCallback, Viewport};
pub use repositories::{HotDealRepository, SaveOutcome, save_by_natural_key};
pub use statistics::DealStatistics;
