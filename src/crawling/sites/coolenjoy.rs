//! 쿨엔조이 지름/알뜰정보
//!
//! The list is a stack of `li` rows styled as table cells; views and date
//! only exist as positional cells.

use crate::crawling::source_config::{PageUrlTemplate, SourceConfig};
use crate::crawling::strategy::SiteStrategy;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::extraction::{DetailSelectors, FieldSpec, ImageRules, ListingSelectors};
use crate::infrastructure::normalize::PriceRules;

use super::selectors;

const TITLE_LINKS: &[&str] = &["a.na-subject", "a[href*=\"/jirum/\"]", ".subject a", ".title a"];

pub fn config() -> SourceConfig {
    SourceConfig {
        source: HotDealSource::Coolenjoy,
        base_url: "https://coolenjoy.net/bbs/jirum".into(),
        pages: PageUrlTemplate::new(
            "https://coolenjoy.net/bbs/jirum?page=1",
            "https://coolenjoy.net/bbs/jirum?page={page}",
        ),
        listing: ListingSelectors {
            rows: selectors(&[
                "li.d-md-table-row",
                "li[class*=\"d-md-table-row\"]",
                "tr[class*=\"list\"], div.list-row, li.list-body-item",
            ]),
            skip_row_classes: selectors(&["notice", "list_header"]),
            ended_row_classes: selectors(&["sold_out"]),
            title: FieldSpec::any_of(TITLE_LINKS),
            link: FieldSpec {
                attr: Some("href".into()),
                ..FieldSpec::any_of(TITLE_LINKS)
            },
            post_id: Some(FieldSpec {
                attr: Some("href".into()),
                pattern: Some(r"/jirum/(\d+)".into()),
                ..FieldSpec::any_of(TITLE_LINKS)
            }),
            author: Some(FieldSpec::any_of(&[
                "a.sv_member",
                ".sv_member",
                ".member, .nickname, .author, .writer",
            ])),
            category: Some(FieldSpec::any_of(&["div#abcd", "[id=\"abcd\"]"])),
            views: Some(FieldSpec::css(".d-md-table-cell").nth(4)),
            likes: Some(FieldSpec::css("span.rank-icon_vote")),
            comments: Some(FieldSpec::css("span.count-plus").with_pattern(r"(\d+)")),
            date: Some(FieldSpec::css(".d-md-table-cell").nth(3)),
            price: Some(FieldSpec::css("font[color=\"#f89e00\"]")),
            ..ListingSelectors::default()
        },
        list_wait_selector: "li.d-md-table-row, li[class*=\"d-md-table-row\"], li.list-body-item".into(),
        detail: DetailSelectors {
            content: selectors(&["#bo_v_con", ".view-content", ".board-content"]),
            date: Some(FieldSpec::css("#bo_v_info time, .sv_date").with_pattern(
                r"(\d{2,4}[-.]\d{2}[-.]\d{2}(?: \d{2}:\d{2})?)",
            )),
            images: ImageRules::default().excluding_thumbnails(),
        },
        detail_wait_selector: Some("#bo_v_con".into()),
        default_seller: "쿨엔조이".into(),
        price_rules: PriceRules::Standard,
        strategy: SiteStrategy::Coolenjoy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extraction::ListingExtractor;
    use url::Url;

    #[test]
    fn positional_cells_give_views_and_date() {
        let html = r#"<ul class="na-table">
          <li class="d-md-table-row px-3 py-2">
            <div class="d-md-table-cell"><div id="abcd">CPU</div></div>
            <div class="d-md-table-cell"><a class="na-subject" href="https://coolenjoy.net/bbs/jirum/2231201">[11번가] 라이젠 7 7800X3D 429,000원</a>
              <span class="count-plus">5</span></div>
            <div class="d-md-table-cell"><a class="sv_member">쿨러</a></div>
            <div class="d-md-table-cell">08.19</div>
            <div class="d-md-table-cell">1,204</div>
            <div class="d-md-table-cell"><span class="rank-icon_vote">3</span></div>
          </li></ul>"#;
        let config = config();
        let items = ListingExtractor::compile(&config.listing)
            .unwrap()
            .extract(html, &Url::parse(&config.base_url).unwrap());

        assert_eq!(items.len(), 1);
        let row = &items[0];
        assert_eq!(row.source_post_id, "2231201");
        assert_eq!(row.category_text.as_deref(), Some("CPU"));
        assert_eq!(row.date_text.as_deref(), Some("08.19"));
        assert_eq!(row.views_text.as_deref(), Some("1,204"));
        assert_eq!(row.comments_text.as_deref(), Some("5"));
        assert_eq!(row.author.as_deref(), Some("쿨러"));
    }
}
