//! Page-scoped records produced by the extraction bridge
//!
//! Both types are plain data: they cross the boundary between the loaded
//! page and the host and are discarded once a `HotDeal` has been built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One listing row, exactly as read off the board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListItem {
    pub source_post_id: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub views_text: Option<String>,
    pub likes_text: Option<String>,
    pub comments_text: Option<String>,
    pub category_text: Option<String>,
    pub date_text: Option<String>,
    pub price_text: Option<String>,
    pub shipping_text: Option<String>,
    pub is_ended: bool,
    pub thumbnail: Option<String>,
}

/// 상세 페이지에서 얻은 보강 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEnrichment {
    pub content: Option<String>,
    pub images: Vec<String>,
    /// More precise timestamp than the listing's, when the post shows one
    pub posted_at: Option<DateTime<Utc>>,
}

impl DetailEnrichment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.images.is_empty() && self.posted_at.is_none()
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}
