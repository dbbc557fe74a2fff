//! JSON export/import of crawled deals
//!
//! Offline batches: a run's deals can be written to a timestamped document
//! and later replayed into any repository with the same find-before-write
//! rule the crawler uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::config::defaults;
use super::error::{CrawlerError, CrawlerResult};
use crate::domain::deal::{HotDeal, HotDealSource};
use crate::domain::repositories::{HotDealRepository, SaveOutcome, save_by_natural_key};
use crate::domain::statistics::DealStatistics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub export_date: DateTime<Utc>,
    /// Source id, or `all` for a multi-source export
    pub source: String,
    pub total_deals: usize,
    pub version: String,
    #[serde(default)]
    pub exported_by: Option<String>,
    #[serde(default)]
    pub crawled_pages: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub metadata: ExportMetadata,
    pub hotdeals: &'a [HotDeal],
    pub statistics: DealStatistics,
}

/// Lenient read side: older batches carry their records under `data`
#[derive(Debug, Deserialize)]
struct ImportDocument {
    #[serde(default)]
    metadata: Option<ExportMetadata>,
    #[serde(default)]
    hotdeals: Option<Vec<HotDeal>>,
    #[serde(default)]
    data: Option<Vec<HotDeal>>,
}

#[derive(Debug, Clone)]
pub struct ImportedBatch {
    pub metadata: Option<ExportMetadata>,
    pub hotdeals: Vec<HotDeal>,
}

/// Counts from replaying a batch into a repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub created: u32,
    pub updated: u32,
    pub rejected: u32,
}

/// `hotdeal-{source|all}-{timestamp}.json`
pub fn export_file_name(source: Option<HotDealSource>, at: DateTime<Utc>) -> String {
    let label = source.map_or("all", HotDealSource::as_str);
    let stamp = at.to_rfc3339().replace([':', '.'], "-");
    format!("hotdeal-{label}-{stamp}.json")
}

/// Write `deals` into `dir` and return the created file's path
pub async fn export_deals(
    dir: &Path,
    source: Option<HotDealSource>,
    deals: &[HotDeal],
    crawled_pages: Option<u32>,
) -> CrawlerResult<PathBuf> {
    let now = Utc::now();
    let path = dir.join(export_file_name(source, now));

    let document = ExportDocument {
        metadata: ExportMetadata {
            export_date: now,
            source: source.map_or_else(|| "all".to_string(), |s| s.as_str().to_string()),
            total_deals: deals.len(),
            version: defaults::EXPORT_FORMAT_VERSION.to_string(),
            exported_by: Some(format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))),
            crawled_pages,
        },
        hotdeals: deals,
        statistics: DealStatistics::from_deals(deals),
    };

    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| CrawlerError::export(format!("serialize: {e}"), Some(&path)))?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CrawlerError::export(format!("create dir: {e}"), Some(dir)))?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| CrawlerError::export(format!("write: {e}"), Some(&path)))?;

    info!("📁 Exported {} deals to {}", deals.len(), path.display());
    Ok(path)
}

pub fn parse_import(json: &str) -> CrawlerResult<ImportedBatch> {
    let document: ImportDocument = serde_json::from_str(json)
        .map_err(|e| CrawlerError::export(format!("invalid document: {e}"), None))?;

    let hotdeals = document
        .hotdeals
        .or(document.data)
        .ok_or_else(|| CrawlerError::export("document has neither `hotdeals` nor `data`", None))?;

    Ok(ImportedBatch {
        metadata: document.metadata,
        hotdeals,
    })
}

pub async fn import_deals(path: &Path) -> CrawlerResult<ImportedBatch> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CrawlerError::export(format!("read: {e}"), Some(path)))?;
    let batch = parse_import(&json).map_err(|e| match e {
        CrawlerError::Export { message, .. } => CrawlerError::export(message, Some(path)),
        other => other,
    })?;

    if let Some(metadata) = &batch.metadata {
        if metadata.total_deals != batch.hotdeals.len() {
            warn!(
                "⚠️ {} declares {} deals but contains {}",
                path.display(),
                metadata.total_deals,
                batch.hotdeals.len()
            );
        }
    }
    info!("📄 Imported {} deals from {}", batch.hotdeals.len(), path.display());
    Ok(batch)
}

pub async fn replay_into(repository: &dyn HotDealRepository, deals: &[HotDeal]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for deal in deals {
        match save_by_natural_key(repository, deal).await {
            SaveOutcome::Created(_) => summary.created += 1,
            SaveOutcome::Updated(_) => summary.updated += 1,
            SaveOutcome::Rejected => summary.rejected += 1,
        }
    }
    summary
}
