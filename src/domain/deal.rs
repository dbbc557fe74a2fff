//! Canonical hot-deal record and its value objects
//!
//! `HotDeal` is the persisted unit handed to the repository sink. The pair
//! `(source, source_post_id)` is its natural key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::infrastructure::error::CrawlerError;

/// 크롤링 대상 커뮤니티
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotDealSource {
    Ppomppu,
    Ruliweb,
    Clien,
    Quasarzone,
    Coolenjoy,
    Eomisae,
    Itcm,
}

impl HotDealSource {
    pub const ALL: [Self; 7] = [
        Self::Ppomppu,
        Self::Ruliweb,
        Self::Clien,
        Self::Quasarzone,
        Self::Coolenjoy,
        Self::Eomisae,
        Self::Itcm,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ppomppu => "ppomppu",
            Self::Ruliweb => "ruliweb",
            Self::Clien => "clien",
            Self::Quasarzone => "quasarzone",
            Self::Coolenjoy => "coolenjoy",
            Self::Eomisae => "eomisae",
            Self::Itcm => "itcm",
        }
    }

    /// Human readable board name, also the seller fallback for some boards
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Ppomppu => "뽐뿌",
            Self::Ruliweb => "루리웹",
            Self::Clien => "클리앙",
            Self::Quasarzone => "퀘이사존",
            Self::Coolenjoy => "쿨엔조이",
            Self::Eomisae => "어미새",
            Self::Itcm => "잇츠엠",
        }
    }
}

impl fmt::Display for HotDealSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HotDealSource {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| CrawlerError::UnknownSource(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    #[default]
    Active,
    Expired,
}

/// Parsed price.
///
/// Stored as an integer column: the amount itself, `0` when no price could
/// be found, `-1` when the post says the price varies by option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "i64", from = "i64")]
pub enum PriceValue {
    Amount(u64),
    Varies,
    #[default]
    NotFound,
}

impl PriceValue {
    pub const fn amount(self) -> Option<u64> {
        match self {
            Self::Amount(value) => Some(value),
            Self::Varies | Self::NotFound => None,
        }
    }

    pub const fn is_known(self) -> bool {
        matches!(self, Self::Amount(_))
    }
}

impl From<PriceValue> for i64 {
    fn from(value: PriceValue) -> Self {
        match value {
            PriceValue::Amount(amount) => i64::try_from(amount).unwrap_or(i64::MAX),
            PriceValue::Varies => -1,
            PriceValue::NotFound => 0,
        }
    }
}

impl From<i64> for PriceValue {
    fn from(value: i64) -> Self {
        match value {
            0 => Self::NotFound,
            v if v < 0 => Self::Varies,
            v => Self::Amount(v as u64),
        }
    }
}

/// 정규화된 핫딜 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotDeal {
    pub id: String,
    pub source: HotDealSource,
    pub source_post_id: String,
    pub title: String,
    pub category: String,
    pub original_price: PriceValue,
    pub sale_price: PriceValue,
    pub discount_rate: u8,
    pub seller: String,
    pub original_url: String,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_free_shipping: bool,
    pub status: DealStatus,
    pub views: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub author_name: String,
    pub description: Option<String>,
    pub crawled_at: DateTime<Utc>,
    /// The post's own timestamp on the board
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl HotDeal {
    pub fn natural_key(&self) -> (HotDealSource, &str) {
        (self.source, self.source_post_id.as_str())
    }

    pub const fn is_active(&self) -> bool {
        matches!(self.status, DealStatus::Active)
    }
}

/// Partial update applied to an already stored deal on re-crawl.
///
/// Only fields that move over a post's lifetime are carried; identity,
/// title and original timestamps stay as first written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    pub views: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub status: Option<DealStatus>,
    pub sale_price: Option<PriceValue>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DealPatch {
    /// Build the patch that refreshes `existing` from a freshly crawled copy
    pub fn from_fresh(fresh: &HotDeal) -> Self {
        Self {
            views: Some(fresh.views),
            like_count: Some(fresh.like_count),
            comment_count: Some(fresh.comment_count),
            status: Some(fresh.status),
            sale_price: fresh.sale_price.is_known().then_some(fresh.sale_price),
            image_url: fresh.image_url.clone(),
            description: fresh.description.clone(),
            updated_at: Some(fresh.updated_at),
        }
    }

    pub fn apply_to(&self, deal: &mut HotDeal) {
        if let Some(views) = self.views {
            deal.views = views;
        }
        if let Some(likes) = self.like_count {
            deal.like_count = likes;
        }
        if let Some(comments) = self.comment_count {
            deal.comment_count = comments;
        }
        if let Some(status) = self.status {
            deal.status = status;
        }
        if let Some(price) = self.sale_price {
            deal.sale_price = price;
        }
        if let Some(image) = &self.image_url {
            deal.image_url = Some(image.clone());
        }
        if let Some(description) = &self.description {
            deal.description = Some(description.clone());
        }
        deal.updated_at = self.updated_at.unwrap_or_else(Utc::now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_ids_round_trip_through_from_str() {
        for source in HotDealSource::ALL {
            assert_eq!(source.as_str().parse::<HotDealSource>().unwrap(), source);
        }
        assert!("ALGUMON".parse::<HotDealSource>().is_err());
        assert_eq!(" Clien ".parse::<HotDealSource>().unwrap(), HotDealSource::Clien);
    }

    #[test]
    fn price_serializes_with_integer_sentinels() {
        assert_eq!(serde_json::to_string(&PriceValue::Amount(13_900)).unwrap(), "13900");
        assert_eq!(serde_json::to_string(&PriceValue::Varies).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&PriceValue::NotFound).unwrap(), "0");

        let parsed: PriceValue = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, PriceValue::Varies);
    }
}
