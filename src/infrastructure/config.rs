//! Configuration infrastructure
//!
//! Contains configuration loading and management for the hot-deal crawler.
//!
//! Configuration is organized into tiers:
//! 1. Crawl/storage/logging settings (config file, env, CLI flags)
//! 2. Application-managed settings (auto-updated after runs)
//!
//! Environment variables prefixed with `HOTDEAL__` override the file,
//! e.g. `HOTDEAL__CRAWLER__MAX_PAGES=3`.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::options::{CrawlerOptions, Viewport};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub crawler: CrawlerSettings,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub app_managed: AppManagedConfig,
}

/// Which page driver backs a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    /// Headless Chromium over CDP
    #[default]
    Chromium,
    /// Plain HTTP fetch, for server-rendered boards
    Http,
}

/// Crawl behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    pub headless: bool,
    pub max_pages: u32,
    pub page_delay_ms: u64,
    pub post_delay_ms: u64,
    pub navigation_timeout_ms: u64,
    pub detail_timeout_ms: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub time_filter_hours: Option<u32>,
    pub skip_detail: bool,
    /// Politeness delay between sources
    pub source_delay_ms: u64,
    /// Attempts per source when the session itself fails
    pub source_retry_attempts: u32,
    pub source_retry_delay_ms: u64,
    pub engine: BrowserEngine,
    pub chrome_executable: Option<PathBuf>,
    pub http_requests_per_second: u32,
}

/// Where crawled deals go
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// sqlx connection string; `None` uses the app data directory
    pub database_url: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub export_after_run: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log file naming strategy: "unified", "timestamped"
    pub file_naming_strategy: String,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Keep only the most recent log file (delete all others)
    pub keep_only_latest: bool,

    /// Module-specific log level filters (e.g., "sqlx": "warn")
    pub module_filters: HashMap<String, String>,
}

/// Application-managed settings (auto-updated)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppManagedConfig {
    pub config_version: u32,
    /// Last finished run per source id
    pub last_run_at: BTreeMap<String, DateTime<Utc>>,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            headless: true,
            max_pages: defaults::MAX_PAGES,
            page_delay_ms: defaults::PAGE_DELAY_MS,
            post_delay_ms: defaults::POST_DELAY_MS,
            navigation_timeout_ms: defaults::NAVIGATION_TIMEOUT_MS,
            detail_timeout_ms: defaults::DETAIL_TIMEOUT_MS,
            viewport_width: defaults::VIEWPORT_WIDTH,
            viewport_height: defaults::VIEWPORT_HEIGHT,
            user_agent: defaults::USER_AGENT.to_string(),
            time_filter_hours: None,
            skip_detail: false,
            source_delay_ms: defaults::SOURCE_DELAY_MS,
            source_retry_attempts: defaults::SOURCE_RETRY_ATTEMPTS,
            source_retry_delay_ms: defaults::SOURCE_RETRY_DELAY_MS,
            engine: BrowserEngine::default(),
            chrome_executable: None,
            http_requests_per_second: defaults::HTTP_REQUESTS_PER_SECOND,
        }
    }
}

impl CrawlerSettings {
    /// Build the immutable per-run options from the settings
    pub fn to_options(&self) -> CrawlerOptions {
        CrawlerOptions {
            headless: self.headless,
            max_pages: self.max_pages.max(1),
            delay_ms: self.page_delay_ms,
            timeout_ms: self.navigation_timeout_ms,
            viewport: Viewport {
                width: self.viewport_width,
                height: self.viewport_height,
            },
            user_agent: self.user_agent.clone(),
            time_filter_hours: self.time_filter_hours,
            skip_detail: self.skip_detail,
            post_delay_ms: self.post_delay_ms,
            detail_timeout_ms: self.detail_timeout_ms,
            on_progress: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            file_naming_strategy: defaults::LOG_FILE_NAMING_STRATEGY.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            keep_only_latest: defaults::LOG_KEEP_ONLY_LATEST,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("chromiumoxide".to_string(), "warn".to_string());
                filters.insert("tungstenite".to_string(), "warn".to_string());
                filters.insert("sqlx".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(data_dir)
    }

    /// Default sqlite location under the app data directory
    pub fn default_database_url() -> Result<String> {
        let path = Self::get_app_data_dir()?.join("database").join("hotdeals.db");
        Ok(format!("sqlite://{}", path.display()))
    }

    pub fn default_export_dir() -> Result<PathBuf> {
        Ok(Self::get_app_data_dir()?.join("exports"))
    }

    /// Create a new configuration manager at the standard location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Use an explicit config file path
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Initialize configuration system on first run
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        if self.config_path.exists() {
            return self.load_config().await;
        }

        info!("🎉 First run detected - initializing default configuration");
        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        if let Err(e) = Self::create_data_directories().await {
            warn!("⚠️ Could not create data directories: {:#}", e);
        }
        info!("✅ Initial configuration setup completed");
        Ok(default_config)
    }

    /// Create necessary data directories
    async fn create_data_directories() -> Result<()> {
        let app_data_dir = Self::get_app_data_dir()?;

        for dir in [app_data_dir.join("database"), app_data_dir.join("exports")] {
            if !dir.exists() {
                fs::create_dir_all(&dir)
                    .await
                    .with_context(|| format!("Failed to create directory: {:?}", dir))?;
                info!("📁 Created directory: {:?}", dir);
            }
        }

        Ok(())
    }

    /// Load configuration from file with `HOTDEAL__` environment overrides.
    ///
    /// A missing file yields defaults; an unreadable one is backed up and
    /// replaced by defaults.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, using defaults: {:?}", self.config_path);
            return Self::layered(None);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        if let Err(parse_error) = serde_json::from_str::<serde_json::Value>(&content) {
            warn!("⚠️  Configuration file is not valid JSON: {}", parse_error);
            let backup_path = self.config_path.with_extension("json.corrupted");
            if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                warn!("Failed to create backup of corrupted config: {}", e);
            } else {
                info!("Backed up corrupted config to: {:?}", backup_path);
            }
            let default_config = AppConfig::default();
            self.save_config(&default_config)
                .await
                .context("Failed to save default configuration")?;
            info!("✅ Reset to default configuration");
            return Self::layered(None);
        }

        let config = Self::layered(Some(&self.config_path))?;
        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    fn layered(file: Option<&Path>) -> Result<AppConfig> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }
        let layered = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to assemble configuration sources")?;

        layered
            .try_deserialize::<AppConfig>()
            .context("Failed to deserialize configuration")
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Update app-managed settings (like last run timestamps)
    pub async fn update_app_managed<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut AppManagedConfig),
    {
        let mut config = self.load_config().await?;
        updater(&mut config.app_managed);
        self.save_config(&config).await
    }
}

/// Default values shared by config, options and the CLI
pub mod defaults {
    pub const APP_DIR_NAME: &str = "hotdeal-crawler";
    pub const CONFIG_FILE_NAME: &str = "hotdeal_crawler_config.json";
    pub const ENV_PREFIX: &str = "HOTDEAL";

    /// Listing pages per source and run
    pub const MAX_PAGES: u32 = 2;

    /// Delay between listing pages
    pub const PAGE_DELAY_MS: u64 = 3000;

    /// Delay between posts on one page
    pub const POST_DELAY_MS: u64 = 200;

    /// Strict listing navigation timeout (DOM loaded)
    pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;

    /// Looser second listing attempt (full load)
    pub const LOOSE_NAVIGATION_TIMEOUT_MS: u64 = 20_000;

    /// Detail pages are optional enrichment, so they get less time
    pub const DETAIL_TIMEOUT_MS: u64 = 15_000;

    /// Browser-wide default for any CDP request
    pub const SESSION_REQUEST_TIMEOUT_MS: u64 = 60_000;

    /// How long to wait for a board's list container
    pub const LIST_WAIT_TIMEOUT_MS: u64 = 10_000;

    /// How long to wait for a detail content block
    pub const DETAIL_CONTENT_WAIT_MS: u64 = 8_000;

    pub const VIEWPORT_WIDTH: u32 = 1920;
    pub const VIEWPORT_HEIGHT: u32 = 1080;

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const LOCALE: &str = "ko-KR";
    pub const TIMEZONE: &str = "Asia/Seoul";
    pub const ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";
    pub const ACCEPT: &str =
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

    /// Consecutive stale posts before paging stops
    pub const STALE_POST_THRESHOLD: u32 = 5;

    /// Time filter applied when a caller enables it without a value
    pub const TIME_FILTER_HOURS: u32 = 24;

    pub const SOURCE_DELAY_MS: u64 = 2000;
    pub const SOURCE_RETRY_ATTEMPTS: u32 = 1;
    pub const SOURCE_RETRY_DELAY_MS: u64 = 5000;

    pub const RETRY_BASE_BACKOFF_MS: u64 = 500;
    pub const RETRY_MAX_BACKOFF_MS: u64 = 10_000;

    /// Rows per page assumed by the progress projection
    pub const POSTS_PER_PAGE_ESTIMATE: u32 = 20;

    pub const HTTP_REQUESTS_PER_SECOND: u32 = 2;

    pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = true;
    pub const LOG_FILE_NAMING_STRATEGY: &str = "unified";
    pub const LOG_MAX_FILES: u32 = 5;
    pub const LOG_AUTO_CLEANUP: bool = true;
    pub const LOG_KEEP_ONLY_LATEST: bool = false;
}
