//! 클리앙 알뜰구매

use crate::crawling::source_config::{PageUrlTemplate, SourceConfig};
use crate::crawling::strategy::SiteStrategy;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::extraction::{DetailSelectors, FieldSpec, ImageRules, ListingSelectors};
use crate::infrastructure::normalize::PriceRules;

use super::selectors;

pub fn config() -> SourceConfig {
    SourceConfig {
        source: HotDealSource::Clien,
        base_url: "https://www.clien.net/service/board/jirum".into(),
        pages: PageUrlTemplate::new(
            "https://www.clien.net/service/board/jirum",
            "https://www.clien.net/service/board/jirum?&po={page}",
        )
        .zero_based(),
        listing: ListingSelectors {
            rows: selectors(&["div.list_item.symph_row.jirum", "div.list_item.symph_row"]),
            skip_row_classes: selectors(&["notice"]),
            ended_row_classes: selectors(&["sold_out"]),
            title: FieldSpec::any_of(&["div.list_title a span.subject_fixed", "div.list_title a"]),
            link: FieldSpec::attr("div.list_title a", "href"),
            post_id: Some(FieldSpec::row_attr("data-board-sn")),
            author: Some(FieldSpec::any_of(&[
                "div.list_author span.nickname span",
                "div.list_author span.nickname",
            ])),
            category: Some(FieldSpec::css("span.category")),
            views: Some(FieldSpec::css("div.list_hit span.hit")),
            likes: Some(FieldSpec::css("div.list_symph em")),
            comments: Some(FieldSpec::row_attr("data-comment-count")),
            date: Some(FieldSpec::css("div.list_time span.timestamp")),
            ..ListingSelectors::default()
        },
        list_wait_selector: "div.list_item".into(),
        detail: DetailSelectors {
            content: selectors(&[".post_article", ".post_content", ".content_view", ".board_main"]),
            date: Some(FieldSpec::css(".post_author .view_count.date").with_pattern(
                r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})",
            )),
            images: ImageRules::default(),
        },
        detail_wait_selector: Some(".post_article, .post_content".into()),
        default_seller: "클리앙".into(),
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
    fn id_and_comments_come_from_row_attributes() {
        let html = r#"<div class="list_content">
          <div class="list_item symph_row jirum notice" data-board-sn="1" data-comment-count="0">
            <div class="list_title"><a href="/service/board/jirum/1"><span class="subject_fixed">규칙</span></a></div></div>
          <div class="list_item symph_row jirum sold_out" data-board-sn="18812345" data-comment-count="23">
            <div class="list_title"><span class="category">PC/하드웨어</span>
              <a href="/service/board/jirum/18812345?od=T31"><span class="subject_fixed">[다나와] SSD 1TB 79,000원</span></a></div>
            <div class="list_symph"><em>4</em></div>
            <div class="list_author"><span class="nickname"><span>클리앙러</span></span></div>
            <div class="list_hit"><span class="hit">1.2 k</span></div>
            <div class="list_time"><span class="timestamp">2025-08-19 21:14:03</span></div>
          </div></div>"#;
        let config = config();
        let items = ListingExtractor::compile(&config.listing)
            .unwrap()
            .extract(html, &Url::parse(&config.base_url).unwrap());

        assert_eq!(items.len(), 1);
        let row = &items[0];
        assert_eq!(row.source_post_id, "18812345");
        assert_eq!(row.comments_text.as_deref(), Some("23"));
        assert_eq!(row.url, "https://www.clien.net/service/board/jirum/18812345?od=T31");
        assert!(row.is_ended);
        assert_eq!(row.views_text.as_deref(), Some("1.2 k"));
        assert_eq!(row.author.as_deref(), Some("클리앙러"));
    }
}
