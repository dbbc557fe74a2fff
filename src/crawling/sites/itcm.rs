//! 잇츠엠 특가 게시판, backed by the configurable crawler

use crate::crawling::generic::{CommunityBoard, RegexOverrides};
use crate::crawling::source_config::SourceConfig;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::normalize::PriceRules;

use super::selectors;

pub fn board() -> CommunityBoard {
    let css = |s: &str| Some(s.to_string());
    CommunityBoard {
        source: HotDealSource::Itcm,
        base_url: "https://www.itcm.co.kr/board/sale".into(),
        board_url: "https://www.itcm.co.kr/board/sale".into(),
        list_rows: ".board-list tbody tr".into(),
        title_link: ".subject a".into(),
        title_text: None,
        image_thumb: css(".subject img.thumb"),
        category: css(".category"),
        author: css(".writer"),
        date: css(".date"),
        views: css(".hit"),
        recommend: css(".recommend"),
        comment_count: css(".comment"),
        ended_mark: css(".end-icon"),
        detail_content: selectors(&[".board-view", ".content-view"]),
        detail_image_prefixes: Vec::new(),
        overrides: RegexOverrides {
            comment_count: Some(r"(\d+)".into()),
            ..RegexOverrides::default()
        },
        default_seller: "잇츠엠".into(),
        price_rules: PriceRules::Generic,
    }
}

pub fn config() -> SourceConfig {
    board().into_source_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawling::strategy::build_deal;
    use crate::domain::deal::PriceValue;
    use crate::domain::listing::{DetailEnrichment, RawListItem};
    use crate::infrastructure::extraction::ListingExtractor;
    use chrono::Utc;
    use rstest::rstest;
    use url::Url;

    #[test]
    fn generic_table_reads_itcm_rows() {
        let html = r#"<table class="board-list"><tbody>
          <tr class="notice"><td class="subject"><a href="/board/sale/1">공지</a></td></tr>
          <tr><td class="category">노트북</td>
              <td class="subject"><a href="/board/sale/40211">[G마켓] LG 그램 16 1,299,000원</a><span class="end-icon"></span></td>
              <td class="writer">잇츠</td><td class="date">08-18</td>
              <td class="hit">811</td><td class="recommend">2</td><td class="comment">[4]</td></tr>
        </tbody></table>"#;
        let config = config();
        let items = ListingExtractor::compile(&config.listing)
            .unwrap()
            .extract(html, &Url::parse(&config.base_url).unwrap());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_post_id, "40211");
        assert_eq!(items[0].url, "https://www.itcm.co.kr/board/sale/40211");
        assert_eq!(items[0].comments_text.as_deref(), Some("4"));
        assert!(items[0].is_ended);
    }

    #[rstest]
    #[case("[G마켓] 캠핑용품 모음전 (가격 다양)", PriceValue::Varies)]
    #[case("[아마존] 로지텍 MX Master 3S $129", PriceValue::Amount(129))]
    #[case("[11번가] LG 그램 16 1,299,000원", PriceValue::Amount(1_299_000))]
    #[case("[네이버] 쿠폰 이벤트", PriceValue::NotFound)]
    fn itcm_titles_use_community_price_rules(#[case] title: &str, #[case] expected: PriceValue) {
        let row = RawListItem {
            source_post_id: "40211".into(),
            title: title.into(),
            url: "https://www.itcm.co.kr/board/sale/40211".into(),
            ..RawListItem::default()
        };
        let deal = build_deal(&config(), &row, &DetailEnrichment::empty(), Utc::now()).unwrap();
        assert_eq!(deal.sale_price, expected);
    }
}
