//! Aggregate statistics over a batch of deals

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::deal::HotDeal;

const POPULAR_VIEWS: u64 = 1000;
const POPULAR_LIKES: u64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealStatistics {
    pub total_deals: u32,
    pub active_deals: u32,
    pub ended_deals: u32,
    pub category_counts: BTreeMap<String, u32>,
    pub store_counts: BTreeMap<String, u32>,
    pub source_counts: BTreeMap<String, u32>,
    pub free_shipping_count: u32,
    pub popular_count: u32,
    pub images_count: u32,
    pub content_count: u32,
}

impl DealStatistics {
    pub fn from_deals<'a, I>(deals: I) -> Self
    where
        I: IntoIterator<Item = &'a HotDeal>,
    {
        deals.into_iter().fold(Self::default(), |mut stats, deal| {
            stats.total_deals += 1;
            if deal.is_active() {
                stats.active_deals += 1;
            } else {
                stats.ended_deals += 1;
            }
            *stats.category_counts.entry(deal.category.clone()).or_default() += 1;
            *stats.store_counts.entry(deal.seller.clone()).or_default() += 1;
            *stats
                .source_counts
                .entry(deal.source.as_str().to_string())
                .or_default() += 1;
            if deal.is_free_shipping {
                stats.free_shipping_count += 1;
            }
            if deal.views >= POPULAR_VIEWS || deal.like_count >= POPULAR_LIKES {
                stats.popular_count += 1;
            }
            if deal.image_url.is_some() {
                stats.images_count += 1;
            }
            if deal.description.as_deref().is_some_and(|d| !d.is_empty()) {
                stats.content_count += 1;
            }
            stats
        })
    }

    /// Merge per-source statistics into one report
    #[must_use]
    pub fn combine(mut self, other: &Self) -> Self {
        self.total_deals += other.total_deals;
        self.active_deals += other.active_deals;
        self.ended_deals += other.ended_deals;
        self.free_shipping_count += other.free_shipping_count;
        self.popular_count += other.popular_count;
        self.images_count += other.images_count;
        self.content_count += other.content_count;
        for (maps, theirs) in [
            (&mut self.category_counts, &other.category_counts),
            (&mut self.store_counts, &other.store_counts),
            (&mut self.source_counts, &other.source_counts),
        ] {
            for (key, count) in theirs {
                *maps.entry(key.clone()).or_default() += count;
            }
        }
        self
    }
}
