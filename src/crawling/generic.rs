//! Configurable crawler for regularly structured boards
//!
//! A `CommunityBoard` is a flat selector record in the shape board admins
//! and contributors tend to write by hand (one CSS selector per field plus
//! a few regex overrides). It expands into a full `SourceConfig` driven by
//! the shared engine with the standard strategy, so adding such a board
//! needs no code beyond the record itself.

use serde::{Deserialize, Serialize};

use super::source_config::{PageUrlTemplate, SourceConfig};
use super::strategy::SiteStrategy;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::error::{CrawlerError, CrawlerResult};
use crate::infrastructure::extraction::{DetailSelectors, FieldSpec, ImageRules, ListingSelectors};
use crate::infrastructure::normalize::PriceRules;

/// Regexes applied on top of the plain selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegexOverrides {
    /// Applied to the title link's `href`
    pub post_id: Option<String>,
    pub date: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityBoard {
    pub source: HotDealSource,
    pub base_url: String,
    pub board_url: String,
    pub list_rows: String,
    pub title_link: String,
    #[serde(default)]
    pub title_text: Option<String>,
    #[serde(default)]
    pub image_thumb: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub views: Option<String>,
    #[serde(default)]
    pub recommend: Option<String>,
    #[serde(default)]
    pub comment_count: Option<String>,
    #[serde(default)]
    pub ended_mark: Option<String>,
    #[serde(default)]
    pub detail_content: Vec<String>,
    #[serde(default)]
    pub detail_image_prefixes: Vec<String>,
    #[serde(default)]
    pub overrides: RegexOverrides,
    pub default_seller: String,
    #[serde(default = "community_price_rules")]
    pub price_rules: PriceRules,
}

const fn community_price_rules() -> PriceRules {
    PriceRules::Generic
}

fn field(selector: Option<&String>, pattern: Option<&String>) -> Option<FieldSpec> {
    selector.map(|selector| FieldSpec {
        pattern: pattern.cloned(),
        ..FieldSpec::css(selector)
    })
}

impl CommunityBoard {
    pub fn from_json(text: &str) -> CrawlerResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| CrawlerError::configuration("community_board", e.to_string()))
    }

    pub fn into_source_config(self) -> SourceConfig {
        let board = self.board_url.trim_end_matches('/');
        let pages = PageUrlTemplate::new(
            &format!("{board}?page=1"),
            &format!("{board}?page={{page}}"),
        );
        let prefixes: Vec<&str> = self.detail_image_prefixes.iter().map(String::as_str).collect();

        SourceConfig {
            source: self.source,
            base_url: self.base_url,
            pages,
            listing: ListingSelectors {
                rows: vec![self.list_rows.clone()],
                skip_row_classes: vec!["notice".to_string()],
                title: FieldSpec::css(self.title_text.as_deref().unwrap_or(&self.title_link)),
                link: FieldSpec::attr(&self.title_link, "href"),
                post_id: self.overrides.post_id.as_deref().map(|pattern| {
                    FieldSpec::attr(&self.title_link, "href").with_pattern(pattern)
                }),
                author: field(self.author.as_ref(), None),
                category: field(self.category.as_ref(), None),
                views: field(self.views.as_ref(), None),
                likes: field(self.recommend.as_ref(), None),
                comments: field(self.comment_count.as_ref(), self.overrides.comment_count.as_ref()),
                date: field(self.date.as_ref(), self.overrides.date.as_ref()),
                ended: field(self.ended_mark.as_ref(), None),
                thumbnail: self.image_thumb.as_deref().map(|s| FieldSpec::attr(s, "src")),
                ..ListingSelectors::default()
            },
            list_wait_selector: self.list_rows,
            detail: DetailSelectors {
                content: self.detail_content,
                date: None,
                images: ImageRules::default().preferring(&prefixes),
            },
            detail_wait_selector: None,
            default_seller: self.default_seller,
            price_rules: self.price_rules,
            strategy: SiteStrategy::Standard,
        }
    }
}
