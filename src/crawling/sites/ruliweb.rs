//! 루리웹 예판/핫딜 게시판

use crate::crawling::source_config::{PageUrlTemplate, SourceConfig};
use crate::crawling::strategy::SiteStrategy;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::extraction::{DetailSelectors, FieldSpec, ImageRules, ListingSelectors};
use crate::infrastructure::normalize::PriceRules;

use super::selectors;

pub fn config() -> SourceConfig {
    SourceConfig {
        source: HotDealSource::Ruliweb,
        base_url: "https://bbs.ruliweb.com/market/board/1020".into(),
        pages: PageUrlTemplate::new(
            "https://bbs.ruliweb.com/market/board/1020?page=1",
            "https://bbs.ruliweb.com/market/board/1020?page={page}",
        ),
        listing: ListingSelectors {
            rows: selectors(&["tbody tr.table_body:not(.notice):not(.best)"]),
            skip_row_classes: selectors(&["notice", "best"]),
            title: FieldSpec::css("td.subject a.subject_link"),
            link: FieldSpec::attr("td.subject a.subject_link", "href"),
            post_id: Some(FieldSpec::css("td.id").with_pattern(r"(\d+)")),
            author: Some(FieldSpec::css("td.writer a")),
            category: Some(FieldSpec::css("td.divsn a strong")),
            views: Some(FieldSpec::css("td.hit")),
            likes: Some(FieldSpec::css("td.recomd")),
            comments: Some(FieldSpec::css("td.subject a.num_reply").with_pattern(r"(\d+)")),
            date: Some(FieldSpec::css("td.time")),
            ..ListingSelectors::default()
        },
        list_wait_selector: "tbody tr.table_body".into(),
        detail: DetailSelectors {
            content: selectors(&[
                ".board_main_view .view_content",
                ".board_content",
                ".view_content",
                ".article_content",
            ]),
            date: Some(FieldSpec::css(".user_info .regdate").with_pattern(
                r"(\d{4}\.\d{2}\.\d{2} \(?\d{2}:\d{2}(?::\d{2})?)",
            )),
            images: ImageRules::default(),
        },
        detail_wait_selector: Some(".board_content, .view_content, .article_content".into()),
        default_seller: "루리웹".into(),
        price_rules: PriceRules::Standard,
        strategy: SiteStrategy::Standard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extraction::ListingExtractor;
    use url::Url;

    #[test]
    fn notice_and_best_rows_are_left_out() {
        let html = r#"<table><tbody>
          <tr class="table_body notice"><td class="id">공지</td><td class="subject"><a class="subject_link" href="/market/board/1020/read/1">공지</a></td></tr>
          <tr class="table_body best"><td class="id">99</td><td class="subject"><a class="subject_link" href="/market/board/1020/read/99">베스트</a></td></tr>
          <tr class="table_body">
            <td class="id"> 98765 </td>
            <td class="divsn"><a><strong>PC/하드웨어</strong></a></td>
            <td class="subject"><a class="subject_link" href="https://bbs.ruliweb.com/market/board/1020/read/98765?page=1">[11번가] 키보드 39,000원</a><a class="num_reply">(8)</a></td>
            <td class="writer"><a>루리웹-123</a></td>
            <td class="recomd">15</td><td class="hit">2,345</td><td class="time">14:05</td>
          </tr></tbody></table>"#;
        let config = config();
        let items = ListingExtractor::compile(&config.listing)
            .unwrap()
            .extract(html, &Url::parse(&config.base_url).unwrap());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_post_id, "98765");
        assert_eq!(items[0].category_text.as_deref(), Some("PC/하드웨어"));
        assert_eq!(items[0].comments_text.as_deref(), Some("8"));
        assert_eq!(items[0].date_text.as_deref(), Some("14:05"));
    }
}
