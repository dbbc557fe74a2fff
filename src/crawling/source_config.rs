//! Per-source configuration record
//!
//! One `SourceConfig` carries everything that differs between boards: the
//! listing URL template, the selector tables, parsing overrides and the
//! strategy arm used when a board's markup needs custom handling. The crawl
//! engine itself is shared.

use serde::{Deserialize, Serialize};
use url::Url;

use super::sites;
use super::strategy::SiteStrategy;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::error::{CrawlerError, CrawlerResult};
use crate::infrastructure::extraction::{DetailSelectors, ListingSelectors};
use crate::infrastructure::normalize::PriceRules;

/// Listing URL for a 1-based page number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUrlTemplate {
    pub first_page: String,
    /// `{page}` is replaced by `page + page_offset`
    pub template: String,
    #[serde(default)]
    pub page_offset: i64,
}

impl PageUrlTemplate {
    pub fn new(first_page: &str, template: &str) -> Self {
        Self {
            first_page: first_page.to_string(),
            template: template.to_string(),
            page_offset: 0,
        }
    }

    /// Boards whose pager counts from zero
    #[must_use]
    pub const fn zero_based(mut self) -> Self {
        self.page_offset = -1;
        self
    }

    pub fn url_for(&self, page: u32) -> String {
        if page <= 1 {
            return self.first_page.clone();
        }
        let number = i64::from(page) + self.page_offset;
        self.template.replace("{page}", &number.to_string())
    }
}

/// 소스별 크롤링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub source: HotDealSource,
    pub base_url: String,
    pub pages: PageUrlTemplate,
    pub listing: ListingSelectors,
    /// Present once the board's list has rendered
    pub list_wait_selector: String,
    pub detail: DetailSelectors,
    pub detail_wait_selector: Option<String>,
    /// Seller used when the title names no known storefront
    pub default_seller: String,
    #[serde(default)]
    pub price_rules: PriceRules,
    #[serde(default)]
    pub strategy: SiteStrategy,
}

impl SourceConfig {
    pub fn base(&self) -> CrawlerResult<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| CrawlerError::configuration("base_url", format!("{}: {e}", self.base_url)))
    }

    pub fn listing_url(&self, page: u32) -> String {
        self.pages.url_for(page)
    }
}

/// Registry lookup
pub fn config_for(source: HotDealSource) -> SourceConfig {
    match source {
        HotDealSource::Ppomppu => sites::ppomppu::config(),
        HotDealSource::Ruliweb => sites::ruliweb::config(),
        HotDealSource::Clien => sites::clien::config(),
        HotDealSource::Quasarzone => sites::quasarzone::config(),
        HotDealSource::Coolenjoy => sites::coolenjoy::config(),
        HotDealSource::Eomisae => sites::eomisae::config(),
        HotDealSource::Itcm => sites::itcm::config(),
    }
}

pub fn all_configs() -> Vec<SourceConfig> {
    HotDealSource::ALL.into_iter().map(config_for).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extraction::{DetailExtractor, ListingExtractor};

    #[test]
    fn clien_pages_count_from_zero() {
        let config = config_for(HotDealSource::Clien);
        assert_eq!(config.listing_url(1), "https://www.clien.net/service/board/jirum");
        assert_eq!(config.listing_url(2), "https://www.clien.net/service/board/jirum?&po=1");
        assert_eq!(config.listing_url(3), "https://www.clien.net/service/board/jirum?&po=2");
    }

    #[test]
    fn one_based_boards_use_the_page_number() {
        let config = config_for(HotDealSource::Ppomppu);
        assert_eq!(
            config.listing_url(3),
            "https://www.ppomppu.co.kr/zboard/zboard.php?id=ppomppu&page=3"
        );
        assert_eq!(
            config_for(HotDealSource::Eomisae).listing_url(1),
            "https://eomisae.co.kr/fs?page=1"
        );
    }

    #[test]
    fn every_registered_table_compiles() {
        for config in all_configs() {
            assert!(config.base().is_ok(), "{}", config.source);
            assert!(ListingExtractor::compile(&config.listing).is_ok(), "{}", config.source);
            assert!(DetailExtractor::compile(&config.detail).is_ok(), "{}", config.source);
            assert!(!config.list_wait_selector.is_empty());
        }
    }

    #[test]
    fn registry_covers_each_source_once() {
        let sources: Vec<HotDealSource> = all_configs().iter().map(|c| c.source).collect();
        assert_eq!(sources, HotDealSource::ALL.to_vec());
    }
}
