//! Listing row → `HotDeal`
//!
//! Most boards go through the standard arm. The other arms cover boards
//! whose titles or labels carry information differently (store prefixes,
//! sold-out markers in the title, fashion-only labels, "price varies"
//! phrasing).

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::source_config::SourceConfig;
use crate::domain::deal::{DealStatus, HotDeal, PriceValue};
use crate::domain::listing::{DetailEnrichment, RawListItem};
use crate::infrastructure::normalize::category::DEFAULT_CATEGORY;
use crate::infrastructure::normalize::pattern::Pattern;
use crate::infrastructure::normalize::{
    clean_title, extract_seller, generate_deal_id, infer_category, infer_hardware_category,
    is_free_shipping, normalize_category_label, parse_count, parse_discount_rate, parse_post_date,
    parse_price_with_rules, parse_store, strip_store_prefix,
};

const ANONYMOUS_AUTHOR: &str = "익명";

static ENDED_TITLE: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\[(?:품절|종료|마감|완료)\]"));
static DIGITS: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"[^0-9]"));

/// Fashion board buckets, checked before the shared keyword table
const FASHION_KEYWORDS: &[(&str, &[&str])] = &[
    ("신발", &["신발", "스니커즈"]),
    ("가방", &["가방", "백팩"]),
    ("모자/액세서리", &["모자", "캡", "시계", "워치", "지갑", "벨트"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SiteStrategy {
    /// Board label if any, else title keywords; seller from the allow-list
    #[default]
    Standard,
    /// Board labels folded through the label map
    Ppomppu,
    /// `[store]` prefix is the seller and is cut from the title
    Quasarzone,
    /// Hardware classifier first, sold-out markers live in the title
    Coolenjoy,
    /// Fashion labels and card layout
    Eomisae,
}

fn digits_only(text: &str) -> String {
    DIGITS.replace_all(text, "").into_owned()
}

fn label(item: &RawListItem) -> Option<&str> {
    item.category_text
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
}

fn eomisae_category(label: Option<&str>, title: &str) -> String {
    if let Some(label) = label {
        if label.contains("패션") {
            return "패션".to_string();
        }
        if label.contains("기타") || label.contains("네이버") {
            return DEFAULT_CATEGORY.to_string();
        }
    }
    let lowered = title.to_lowercase();
    FASHION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map_or_else(|| infer_category(title), |(bucket, _)| (*bucket).to_string())
}

impl SiteStrategy {
    fn category(self, item: &RawListItem, title: &str) -> String {
        match self {
            Self::Coolenjoy => {
                let inferred = infer_hardware_category(title);
                match label(item) {
                    Some(label) if inferred == DEFAULT_CATEGORY => normalize_category_label(label),
                    _ => inferred,
                }
            }
            Self::Eomisae => eomisae_category(label(item), title),
            Self::Standard | Self::Ppomppu | Self::Quasarzone => label(item)
                .map_or_else(|| infer_category(title), normalize_category_label),
        }
    }

    fn seller(self, config: &SourceConfig, item: &RawListItem, title: &str) -> String {
        match self {
            Self::Quasarzone => parse_store(title).unwrap_or_else(|| config.default_seller.clone()),
            Self::Eomisae => parse_store(title)
                .or_else(|| label(item).map(|l| l.trim_end_matches(',').to_string()))
                .unwrap_or_else(|| config.default_seller.clone()),
            Self::Standard | Self::Ppomppu | Self::Coolenjoy => {
                extract_seller(title, &config.default_seller)
            }
        }
    }

    fn display_title(self, title: &str) -> String {
        match self {
            Self::Quasarzone => {
                let stripped = strip_store_prefix(title);
                if stripped.is_empty() {
                    title.to_string()
                } else {
                    stripped
                }
            }
            _ => title.to_string(),
        }
    }

    fn free_shipping(self, item: &RawListItem, title: &str) -> bool {
        if is_free_shipping(title) {
            return true;
        }
        let Some(shipping) = item.shipping_text.as_deref() else {
            return false;
        };
        if is_free_shipping(shipping) {
            return true;
        }
        // "배송비 0원"
        matches!(self, Self::Quasarzone) && digits_only(shipping).trim_start_matches('0').is_empty()
            && shipping.chars().any(|c| c.is_ascii_digit())
    }

    fn is_ended(self, item: &RawListItem, title: &str) -> bool {
        item.is_ended || (matches!(self, Self::Coolenjoy) && ENDED_TITLE.is_match(title))
    }
}

/// A dedicated price element wins over the title
fn resolve_price(config: &SourceConfig, item: &RawListItem, title: &str) -> PriceValue {
    let from_element = item
        .price_text
        .as_deref()
        .and_then(|text| digits_only(text).parse::<u64>().ok())
        .filter(|amount| *amount > 0);
    match from_element {
        Some(amount) => PriceValue::Amount(amount),
        None => parse_price_with_rules(title, config.price_rules),
    }
}

/// Post timestamp: detail page first, then the listing cell, then `now`
pub fn resolve_posted_at(
    item: &RawListItem,
    detail: &DetailEnrichment,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    detail.posted_at.unwrap_or_else(|| {
        item.date_text
            .as_deref()
            .map_or(now, |text| parse_post_date(text, now))
    })
}

/// Build the canonical record. `None` when the title is empty after cleaning.
pub fn build_deal(
    config: &SourceConfig,
    item: &RawListItem,
    detail: &DetailEnrichment,
    now: DateTime<Utc>,
) -> Option<HotDeal> {
    let cleaned = clean_title(&item.title);
    if cleaned.is_empty() {
        return None;
    }
    let strategy = config.strategy;
    let price = resolve_price(config, item, &cleaned);

    Some(HotDeal {
        id: generate_deal_id(&item.source_post_id, now),
        source: config.source,
        source_post_id: item.source_post_id.clone(),
        title: strategy.display_title(&cleaned),
        category: strategy.category(item, &cleaned),
        original_price: price,
        sale_price: price,
        discount_rate: parse_discount_rate(&cleaned),
        seller: strategy.seller(config, item, &cleaned),
        original_url: item.url.clone(),
        image_url: detail
            .primary_image()
            .map(str::to_string)
            .or_else(|| item.thumbnail.clone()),
        thumbnail_url: item.thumbnail.clone(),
        is_free_shipping: strategy.free_shipping(item, &cleaned),
        status: if strategy.is_ended(item, &cleaned) {
            DealStatus::Expired
        } else {
            DealStatus::Active
        },
        views: item.views_text.as_deref().map_or(0, parse_count),
        like_count: item.likes_text.as_deref().map_or(0, parse_count),
        comment_count: item.comments_text.as_deref().map_or(0, parse_count),
        author_name: item
            .author
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string()),
        description: detail.content.clone(),
        crawled_at: now,
        created_at: resolve_posted_at(item, detail, now),
        updated_at: now,
        deleted_at: None,
    })
}
