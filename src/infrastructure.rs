//! Infrastructure layer
//!
//! Browser sessions, page extraction, field normalizers, sinks, export,
//! configuration and logging.

pub mod browser;
pub mod config;
pub mod error;
pub mod extraction;
pub mod json_export;
pub mod logging;
pub mod memory_repository;
pub mod normalize;
pub mod retry;
pub mod sqlite_repository;

pub use browser::{
    BrowserLauncher, ChromiumLauncher, FixtureLauncher, HttpLauncher, PageDriver, WaitCondition,
};
pub use config::{AppConfig, BrowserEngine, ConfigManager, CrawlerSettings};
pub use error::{CrawlerError, CrawlerResult};
pub use json_export::{
    ExportMetadata, ImportedBatch, ReplaySummary, export_deals, import_deals, replay_into,
};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use memory_repository::InMemoryHotDealRepository;
pub use retry::RetryPolicy;
pub use sqlite_repository::SqliteHotDealRepository;
