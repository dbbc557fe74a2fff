//! Repository interface for hot-deal persistence
//!
//! The crawler does not own the store. Uniqueness of
//! `(source, source_post_id)` rests on the find-before-write in
//! [`save_by_natural_key`], which is what makes a crawl safely re-runnable.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use super::deal::{DealPatch, HotDeal, HotDealSource};

#[async_trait]
pub trait HotDealRepository: Send + Sync {
    async fn find_by_source_and_post_id(
        &self,
        source: HotDealSource,
        post_id: &str,
    ) -> Result<Option<HotDeal>>;

    /// `Ok(None)` is a soft failure: the store declined the row
    async fn create(&self, deal: &HotDeal) -> Result<Option<HotDeal>>;

    /// `Ok(None)` is a soft failure: nothing was updated
    async fn update(&self, id: &str, patch: &DealPatch) -> Result<Option<HotDeal>>;
}

/// 저장 결과 분류
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(HotDeal),
    Updated(HotDeal),
    Rejected,
}

/// Check-and-write one deal. Never returns an error: store failures are
/// logged and reported as `Rejected` so a run keeps going.
pub async fn save_by_natural_key(
    repository: &dyn HotDealRepository,
    deal: &HotDeal,
) -> SaveOutcome {
    let (source, post_id) = deal.natural_key();

    let existing = match repository.find_by_source_and_post_id(source, post_id).await {
        Ok(existing) => existing,
        Err(e) => {
            warn!("❌ Lookup failed for {}/{}: {:#}", source, post_id, e);
            return SaveOutcome::Rejected;
        }
    };

    match existing {
        None => match repository.create(deal).await {
            Ok(Some(created)) => {
                debug!("🆕 Created {}/{}", source, post_id);
                SaveOutcome::Created(created)
            }
            Ok(None) => {
                warn!("⚠️ Repository declined create for {}/{}", source, post_id);
                SaveOutcome::Rejected
            }
            Err(e) => {
                warn!("❌ Create failed for {}/{}: {:#}", source, post_id, e);
                SaveOutcome::Rejected
            }
        },
        Some(stored) => {
            let patch = DealPatch::from_fresh(deal);
            match repository.update(&stored.id, &patch).await {
                Ok(Some(updated)) => {
                    debug!("🔄 Updated {}/{}", source, post_id);
                    SaveOutcome::Updated(updated)
                }
                Ok(None) => {
                    warn!("⚠️ Repository declined update for {}/{}", source, post_id);
                    SaveOutcome::Rejected
                }
                Err(e) => {
                    warn!("❌ Update failed for {}/{}: {:#}", source, post_id, e);
                    SaveOutcome::Rejected
                }
            }
        }
    }
}
