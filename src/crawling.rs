//! # Crawling Module
//!
//! Board-specific knowledge and the shared engine that drives it.
//! - `source_config`: per-board configuration record and registry
//! - `sites`: one module per board
//! - `generic`: flat selector records for regularly structured boards
//! - `strategy`: listing row → `HotDeal`
//! - `time_window`: incremental early exit
//! - `engine`: page loop over one browser session

pub mod detail;
pub mod engine;
pub mod generic;
pub mod sites;
pub mod source_config;
pub mod strategy;
pub mod time_window;

pub use engine::SourceCrawler;
pub use generic::{CommunityBoard, RegexOverrides};
pub use source_config::{PageUrlTemplate, SourceConfig, all_configs, config_for};
pub use strategy::{SiteStrategy, build_deal};
pub use time_window::{TimeWindow, WindowDecision};
