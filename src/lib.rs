//! Hot-deal crawler
//!
//! Harvests deal posts from Korean community boards, normalizes them into
//! one `HotDeal` record and writes them through a deduplicating repository.
//!
//! - `domain`: records, run options, results, repository trait
//! - `infrastructure`: browser drivers, extraction, normalizers, sinks, config, logging
//! - `crawling`: per-board configuration and the shared crawl engine
//! - `application`: sequential multi-source orchestration

pub mod application;
pub mod crawling;
pub mod domain;
pub mod infrastructure;

pub use application::{CrawlOrchestrator, OrchestratorReport, OrchestratorSettings};
pub use crawling::SourceCrawler;
pub use domain::{CrawlResult, CrawlerOptions, HotDeal, HotDealRepository, HotDealSource};
pub use infrastructure::{CrawlerError, CrawlerResult};
