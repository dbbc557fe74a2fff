//! In-process hot-deal store, used by tests and `--db memory`

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::deal::{DealPatch, HotDeal, HotDealSource};
use crate::domain::repositories::HotDealRepository;

#[derive(Clone, Default)]
pub struct InMemoryHotDealRepository {
    deals: Arc<RwLock<HashMap<String, HotDeal>>>,
}

impl InMemoryHotDealRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.deals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.deals.read().await.is_empty()
    }

    /// Snapshot ordered by post time, newest first
    pub async fn all(&self) -> Vec<HotDeal> {
        let mut deals: Vec<HotDeal> = self.deals.read().await.values().cloned().collect();
        deals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        deals
    }
}

#[async_trait]
impl HotDealRepository for InMemoryHotDealRepository {
    async fn find_by_source_and_post_id(
        &self,
        source: HotDealSource,
        post_id: &str,
    ) -> Result<Option<HotDeal>> {
        let deals = self.deals.read().await;
        Ok(deals
            .values()
            .find(|deal| deal.natural_key() == (source, post_id))
            .cloned())
    }

    async fn create(&self, deal: &HotDeal) -> Result<Option<HotDeal>> {
        let mut deals = self.deals.write().await;
        let taken = deals.contains_key(&deal.id)
            || deals.values().any(|stored| stored.natural_key() == deal.natural_key());
        if taken {
            return Ok(None);
        }
        deals.insert(deal.id.clone(), deal.clone());
        Ok(Some(deal.clone()))
    }

    async fn update(&self, id: &str, patch: &DealPatch) -> Result<Option<HotDeal>> {
        let mut deals = self.deals.write().await;
        Ok(deals.get_mut(id).map(|deal| {
            patch.apply_to(deal);
            deal.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deal::{DealStatus, PriceValue};
    use chrono::{Duration, Utc};

    fn deal(post_id: &str, age_hours: i64) -> HotDeal {
        let posted = Utc::now() - Duration::hours(age_hours);
        HotDeal {
            id: format!("hotdeal_1_{post_id}"),
            source: HotDealSource::Quasarzone,
            source_post_id: post_id.into(),
            title: "그래픽카드".into(),
            category: "컴퓨터/부품".into(),
            original_price: PriceValue::NotFound,
            sale_price: PriceValue::NotFound,
            discount_rate: 0,
            seller: "퀘이사존".into(),
            original_url: format!("https://quasarzone.com/bbs/qb_saleinfo/views/{post_id}"),
            image_url: None,
            thumbnail_url: None,
            is_free_shipping: false,
            status: DealStatus::Active,
            views: 0,
            like_count: 0,
            comment_count: 0,
            author_name: "익명".into(),
            description: None,
            crawled_at: posted,
            created_at: posted,
            updated_at: posted,
            deleted_at: None,
        }
    }

    #[test]
    fn natural_key_twin_is_declined_and_snapshot_is_newest_first() {
        tokio_test::block_on(async {
            let repository = InMemoryHotDealRepository::new();
            tokio_test::assert_ok!(repository.create(&deal("1", 5)).await);
            tokio_test::assert_ok!(repository.create(&deal("2", 1)).await);

            let mut twin = deal("1", 0);
            twin.id = "another-id".into();
            assert!(repository.create(&twin).await.unwrap().is_none());

            let ids: Vec<String> =
                repository.all().await.into_iter().map(|d| d.source_post_id).collect();
            assert_eq!(ids, vec!["2", "1"]);
        });
    }
}
