//! 퀘이사존 지름/할인정보

use crate::crawling::source_config::{PageUrlTemplate, SourceConfig};
use crate::crawling::strategy::SiteStrategy;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::extraction::{DetailSelectors, FieldSpec, ImageRules, ListingSelectors};
use crate::infrastructure::normalize::PriceRules;

use super::selectors;

pub fn config() -> SourceConfig {
    SourceConfig {
        source: HotDealSource::Quasarzone,
        base_url: "https://quasarzone.com/bbs/qb_saleinfo".into(),
        pages: PageUrlTemplate::new(
            "https://quasarzone.com/bbs/qb_saleinfo?page=1",
            "https://quasarzone.com/bbs/qb_saleinfo?page={page}",
        ),
        listing: ListingSelectors {
            rows: selectors(&["div.market-type-list table tbody tr", "table tbody tr"]),
            require_row_marker: Some("div.market-info-list".into()),
            title: FieldSpec::any_of(&[
                "a.subject-link span.ellipsis-with-reply-cnt",
                "a.subject-link",
            ]),
            link: FieldSpec::attr("a.subject-link", "href"),
            post_id: Some(FieldSpec::attr("a.subject-link", "href").with_pattern(r"/views/(\d+)")),
            author: Some(FieldSpec::css("span.user-nick-wrap .user-nick-text")),
            category: Some(FieldSpec::css("span.category")),
            views: Some(FieldSpec::css("span.count")),
            likes: Some(FieldSpec::css("td:first-child span.num")),
            comments: Some(FieldSpec::css("span.board-list-comment span.ctn-count")),
            date: Some(FieldSpec::css("span.date")),
            price: Some(FieldSpec::css("span.text-orange")),
            shipping: Some(
                FieldSpec::css("div.market-info-sub p:first-child").with_pattern(r"(배송비[^|]*)"),
            ),
            ended: Some(FieldSpec::css("span.label").with_pattern("(종료)")),
            ..ListingSelectors::default()
        },
        list_wait_selector: "div.market-info-list".into(),
        detail: DetailSelectors {
            content: selectors(&[
                ".view-content",
                ".board-contents",
                ".article-content",
                ".post-content",
            ]),
            date: None,
            images: ImageRules::default().preferring(&["https://img2.quasarzone.com/editor/"]),
        },
        detail_wait_selector: Some(".view-content, .board-contents".into()),
        default_seller: "퀘이사존".into(),
        price_rules: PriceRules::Standard,
        strategy: SiteStrategy::Quasarzone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extraction::ListingExtractor;
    use url::Url;

    #[test]
    fn rows_without_market_info_are_ignored() {
        let html = r#"<div class="market-type-list"><table><tbody>
          <tr><td colspan="2">광고 배너</td></tr>
          <tr>
            <td><span class="num">12</span></td>
            <td><div class="market-info-list">
              <p class="tit"><a class="subject-link" href="/bbs/qb_saleinfo/views/1744321">
                <span class="label done">종료</span>
                <span class="ellipsis-with-reply-cnt">[아마존] WD SN850X 2TB</span></a>
                <span class="board-list-comment"><span class="ctn-count">31</span></span></p>
              <div class="market-info-sub">
                <p><span class="category">PC/하드웨어</span>
                   <span class="text-orange">￦ 189,000 (KRW)</span> | <span>배송비 무료</span></p>
                <p><span class="user-nick-wrap"><span class="user-nick-text">퀘이사</span></span>
                   <span class="count">4.5k</span><span class="date">08-19</span></p>
              </div></div></td>
          </tr></tbody></table></div>"#;
        let config = config();
        let items = ListingExtractor::compile(&config.listing)
            .unwrap()
            .extract(html, &Url::parse(&config.base_url).unwrap());

        assert_eq!(items.len(), 1);
        let row = &items[0];
        assert_eq!(row.source_post_id, "1744321");
        assert_eq!(row.title, "[아마존] WD SN850X 2TB");
        assert_eq!(row.price_text.as_deref(), Some("￦ 189,000 (KRW)"));
        assert_eq!(row.shipping_text.as_deref(), Some("배송비 무료"));
        assert_eq!(row.likes_text.as_deref(), Some("12"));
        assert_eq!(row.views_text.as_deref(), Some("4.5k"));
        assert!(row.is_ended);
    }
}
