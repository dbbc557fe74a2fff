//! hotdeal-crawler command line

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hotdeal_crawler::application::{CrawlOrchestrator, OrchestratorReport, OrchestratorSettings};
use hotdeal_crawler::crawling::all_configs;
use hotdeal_crawler::domain::{HotDealRepository, HotDealSource};
use hotdeal_crawler::infrastructure::browser::launcher_for;
use hotdeal_crawler::infrastructure::config::{AppConfig, BrowserEngine, ConfigManager};
use hotdeal_crawler::infrastructure::json_export::{import_deals, replay_into};
use hotdeal_crawler::infrastructure::logging::{init_logging_with_config, log_system_info};
use hotdeal_crawler::infrastructure::{InMemoryHotDealRepository, SqliteHotDealRepository};

#[derive(Parser)]
#[command(name = "hotdeal-crawler", version, about = "Korean community hot-deal crawler")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl one board or all of them
    Crawl(CrawlArgs),
    /// Replay an exported JSON batch into the store
    Import {
        file: PathBuf,
        #[arg(long)]
        db: Option<String>,
    },
    /// List the known boards
    Sources,
}

#[derive(Args)]
struct CrawlArgs {
    /// Source id, comma separated ids, or `all`
    #[arg(long, short, default_value = "all", value_parser = parse_sources)]
    source: SourceList,
    #[arg(long)]
    pages: Option<u32>,
    /// Only keep posts from the last N hours and stop early on stale pages
    #[arg(long)]
    hours: Option<u32>,
    /// Delay between listing pages (ms)
    #[arg(long)]
    delay: Option<u64>,
    /// Listing navigation timeout (ms)
    #[arg(long)]
    timeout: Option<u64>,
    #[arg(long)]
    headful: bool,
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,
    #[arg(long)]
    skip_detail: bool,
    /// Write the collected deals as JSON into this directory
    #[arg(long)]
    export: Option<PathBuf>,
    /// sqlx sqlite URL, or `memory`
    #[arg(long)]
    db: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineArg {
    Chromium,
    Http,
}

impl From<EngineArg> for BrowserEngine {
    fn from(engine: EngineArg) -> Self {
        match engine {
            EngineArg::Chromium => Self::Chromium,
            EngineArg::Http => Self::Http,
        }
    }
}

#[derive(Clone)]
struct SourceList(Vec<HotDealSource>);

fn parse_sources(raw: &str) -> Result<SourceList, String> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(SourceList(HotDealSource::ALL.to_vec()));
    }
    let mut sources = Vec::new();
    for id in raw.split(',').filter(|id| !id.trim().is_empty()) {
        let source: HotDealSource = id.parse().map_err(|e| format!("{e}"))?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    if sources.is_empty() {
        return Err("no source given".to_string());
    }
    Ok(SourceList(sources))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = manager.initialize_on_first_run().await?;

    if let Err(e) = init_logging_with_config(&config.logging) {
        eprintln!("Logging disabled: {e:#}");
    }
    log_system_info();

    match cli.command {
        Command::Crawl(args) => crawl(&manager, config, args).await,
        Command::Import { file, db } => import(&config, &file, db).await,
        Command::Sources => {
            for source_config in all_configs() {
                println!(
                    "{:<11} {:<6} {}",
                    source_config.source.as_str(),
                    source_config.source.display_name(),
                    source_config.listing_url(1)
                );
            }
            Ok(())
        }
    }
}

async fn open_repository(
    config: &AppConfig,
    db: Option<String>,
) -> Result<Arc<dyn HotDealRepository>> {
    let url = match db.or_else(|| config.storage.database_url.clone()) {
        Some(url) => url,
        None => ConfigManager::default_database_url()?,
    };
    if url == "memory" {
        warn!("⚠️ Using the in-memory store, nothing will be persisted");
        return Ok(Arc::new(InMemoryHotDealRepository::new()));
    }
    let repository = SqliteHotDealRepository::connect(&url)
        .await
        .with_context(|| format!("Failed to open hot-deal store {url}"))?;
    Ok(Arc::new(repository))
}

async fn crawl(manager: &ConfigManager, mut config: AppConfig, args: CrawlArgs) -> Result<()> {
    let settings = &mut config.crawler;
    if let Some(pages) = args.pages {
        settings.max_pages = pages.max(1);
    }
    if args.hours.is_some() {
        settings.time_filter_hours = args.hours;
    }
    if let Some(delay) = args.delay {
        settings.page_delay_ms = delay;
    }
    if let Some(timeout) = args.timeout {
        settings.navigation_timeout_ms = timeout;
    }
    if args.headful {
        settings.headless = false;
    }
    if let Some(engine) = args.engine {
        settings.engine = engine.into();
    }
    settings.skip_detail |= args.skip_detail;

    let options = config.crawler.to_options().with_progress(Arc::new(
        |current: u32, total: u32, message: &str| {
            debug!("[{}/{}] {}", current, total, message);
        },
    ));

    let repository = open_repository(&config, args.db).await?;
    let mut orchestrator_settings =
        OrchestratorSettings::from_config(&config.crawler, &config.storage);
    if args.export.is_some() {
        orchestrator_settings = orchestrator_settings.with_export_dir(args.export);
    }

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ Ctrl-C received, finishing the current source");
            signal_token.cancel();
        }
    });

    let orchestrator = CrawlOrchestrator::new(
        launcher_for(&config.crawler),
        repository,
        orchestrator_settings,
    )
    .with_cancellation(token);
    let report = orchestrator.run(&args.source.0, &options).await;
    print_report(&report);

    let finished_at = Utc::now();
    let finished: Vec<HotDealSource> = report
        .results
        .iter()
        .map(|result| result.source)
        .filter(|source| !report.failures.contains_key(source))
        .collect();
    if let Err(e) = manager
        .update_app_managed(|managed| {
            for source in &finished {
                managed.last_run_at.insert(source.as_str().to_string(), finished_at);
            }
        })
        .await
    {
        warn!("⚠️ Could not record last run time: {:#}", e);
    }

    if !report.is_success() {
        bail!("{} source(s) failed", report.failures.len());
    }
    Ok(())
}

fn print_report(report: &OrchestratorReport) {
    println!(
        "{:<11} {:>7} {:>5} {:>7} {:>6} {:>5} {:>8}",
        "source", "crawled", "new", "updated", "errors", "pages", "ms"
    );
    for result in &report.results {
        println!(
            "{:<11} {:>7} {:>5} {:>7} {:>6} {:>5} {:>8}",
            result.source.as_str(),
            result.total_crawled,
            result.new_deals,
            result.updated_deals,
            result.errors,
            result.pages_crawled,
            result.duration_ms
        );
    }
    println!(
        "{:<11} {:>7} {:>5} {:>7} {:>6} {:>5} {:>8}",
        "total",
        report.total_crawled,
        report.new_deals,
        report.updated_deals,
        report.errors,
        report.pages_crawled(),
        report.duration_ms
    );
    for (source, message) in &report.failures {
        println!("  ❌ {}: {}", source, message);
    }
    if !report.skipped.is_empty() {
        println!("  ⏹️ skipped: {:?}", report.skipped);
    }
    if let Some(path) = &report.export_path {
        println!("  📁 {}", path.display());
    }
}

async fn import(config: &AppConfig, file: &Path, db: Option<String>) -> Result<()> {
    let batch = import_deals(file)
        .await
        .with_context(|| format!("Failed to import {}", file.display()))?;
    let repository = open_repository(config, db).await?;

    let summary = replay_into(repository.as_ref(), &batch.hotdeals).await;
    info!(
        "✅ Import done: {} created, {} updated, {} rejected",
        summary.created, summary.updated, summary.rejected
    );
    println!(
        "{} deals: {} created, {} updated, {} rejected",
        batch.hotdeals.len(),
        summary.created,
        summary.updated,
        summary.rejected
    );
    Ok(())
}
