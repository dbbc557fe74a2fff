//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - File logging with rotation of the previous run's file
//! - Configuration file based log level control
//! - Structured JSON logging (optional)
//! - Console and file output support
//! - KST (Korea Standard Time) timestamps

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Utc;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Subscriber, info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::normalize::date::kst_offset;

const LOG_FILE_STEM: &str = "hotdeal-crawler";

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Custom time formatter for KST (Korea Standard Time, UTC+9)
struct KstTimeFormatter;

impl FormatTime for KstTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let kst_time = Utc::now().with_timezone(&kst_offset());
        write!(w, "{}", kst_time.format("%Y-%m-%d %H:%M:%S%.3f %z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// File name for this run's log
fn log_file_name(config: &LoggingConfig) -> String {
    match config.file_naming_strategy.as_str() {
        "timestamped" => {
            let now = Utc::now().with_timezone(&kst_offset());
            format!("{}-{}.log", LOG_FILE_STEM, now.format("%Y%m%d"))
        }
        _ => format!("{}.log", LOG_FILE_STEM),
    }
}

/// Rotate existing log file by renaming it with its timestamp
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<()> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(());
    }

    let metadata = std::fs::metadata(&log_file_path)
        .map_err(|e| anyhow!("Failed to get log file metadata: {}", e))?;
    let file_time = metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or_else(|_| std::time::SystemTime::now());

    let datetime: chrono::DateTime<Utc> = file_time.into();
    let kst_datetime = datetime.with_timezone(&kst_offset());

    let file_stem = log_file_name.trim_end_matches(".log");
    let timestamped_name = format!("{}.{}.log", file_stem, kst_datetime.format("%Y%m%dT%H%M%S"));
    let timestamped_path = log_dir.join(&timestamped_name);

    std::fs::rename(&log_file_path, &timestamped_path).map_err(|e| {
        anyhow!(
            "Failed to rotate log file {} to {}: {}",
            log_file_path.display(),
            timestamped_path.display(),
            e
        )
    })?;

    Ok(())
}

/// Console layer with KST time, omitted when console output is off
fn console_layer<S>(enabled: bool) -> Option<impl Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    enabled.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(KstTimeFormatter)
            .with_target(false)
    })
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured level with
/// noisy dependency targets capped unless the level asks for trace.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);

        if !config.level.to_lowercase().contains("trace") {
            let mut directives: Vec<String> = config
                .module_filters
                .iter()
                .map(|(target, level)| format!("{}={}", target, level))
                .collect();
            directives.sort();
            directives.push(format!("hotdeal_crawler={}", config.level));

            for directive in directives {
                match directive.parse() {
                    Ok(parsed) => filter = filter.add_directive(parsed),
                    Err(e) => eprintln!("Ignoring invalid log directive '{}': {}", directive, e),
                }
            }
        }

        filter
    })
}

/// Initialize logging with custom configuration
///
/// # Environment Variable Override
/// ```bash
/// # Show CDP traffic while debugging a board
/// RUST_LOG="debug,chromiumoxide=debug" hotdeal-crawler crawl --source clien
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let log_dir = get_log_directory();
    let file_name = log_file_name(config);

    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;
        rotate_existing_log_file(&log_dir, &file_name)?;
        if config.auto_cleanup_logs {
            cleanup_old_logs(&log_dir, config)?;
        }
    }

    let registry = Registry::default().with(build_env_filter(config));

    match (config.file_output, config.json_format) {
        (true, json) => {
            let file_appender = rolling::never(&log_dir, &file_name);
            let (file_writer, file_guard) = non_blocking(file_appender);
            LOG_GUARDS
                .lock()
                .map_err(|_| anyhow!("Log guard registry poisoned"))?
                .push(file_guard);

            if json {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(KstTimeFormatter)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false);
                registry
                    .with(file_layer)
                    .with(console_layer(config.console_output))
                    .try_init()?;
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(KstTimeFormatter)
                    .with_target(false)
                    .with_ansi(false);
                registry
                    .with(file_layer)
                    .with(console_layer(config.console_output))
                    .try_init()?;
            }
        }
        (false, _) => {
            if !config.console_output {
                return Err(anyhow!("No logging output configured"));
            }
            registry.with(console_layer(true)).try_init()?;
        }
    }

    info!("Logging system initialized");
    info!("Log directory: {:?}", log_dir);
    info!("Log level: {}", config.level);
    if config.level.to_lowercase().contains("trace") {
        info!("TRACE level active - browser and SQL internals will be shown");
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Hot-deal crawler ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    info!("Log directory: {:?}", get_log_directory());
}

/// Clean up old log files based on configuration
fn cleanup_old_logs(log_dir: &Path, config: &LoggingConfig) -> Result<()> {
    let mut log_files = Vec::new();

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".log"));
        if path.is_file() && is_log {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                log_files.push((path, modified));
            }
        }
    }

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let keep = if config.keep_only_latest {
        1
    } else {
        config.max_files as usize
    };

    for (path, _) in log_files.iter().skip(keep) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove old log file {:?}: {}", path, e);
        }
    }

    Ok(())
}
