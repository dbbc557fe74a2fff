//! 뽐뿌 자유게시판 핫딜

use crate::crawling::source_config::{PageUrlTemplate, SourceConfig};
use crate::crawling::strategy::SiteStrategy;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::extraction::{DetailSelectors, FieldSpec, ImageRules, ListingSelectors};
use crate::infrastructure::normalize::PriceRules;

use super::selectors;

const TITLE_LINK: &str = "td.baseList-space.title > div > div > a";

pub fn config() -> SourceConfig {
    SourceConfig {
        source: HotDealSource::Ppomppu,
        base_url: "https://www.ppomppu.co.kr/zboard/zboard.php?id=ppomppu".into(),
        pages: PageUrlTemplate::new(
            "https://www.ppomppu.co.kr/zboard/zboard.php?id=ppomppu&page=1",
            "https://www.ppomppu.co.kr/zboard/zboard.php?id=ppomppu&page={page}",
        ),
        listing: ListingSelectors {
            rows: selectors(&["#revolution_main_table > tbody > tr.baseList"]),
            skip_row_classes: selectors(&["baseNotice"]),
            title: FieldSpec::any_of(&[
                "td.baseList-space.title > div > div > a > span",
                TITLE_LINK,
            ]),
            link: FieldSpec::attr(TITLE_LINK, "href"),
            post_id: Some(FieldSpec::attr(TITLE_LINK, "href").with_pattern(r"no=(\d+)")),
            author: Some(FieldSpec::any_of(&[
                "td:nth-child(3) > div > nobr > a > span",
                "span.baseList-name",
            ])),
            category: Some(FieldSpec::css("td.baseList-space.title > div > small")),
            views: Some(FieldSpec::css("td.baseList-space.baseList-views")),
            likes: Some(FieldSpec::css("td.baseList-space.baseList-rec")),
            comments: Some(FieldSpec::css("td.baseList-space.title > div > div > span")),
            date: Some(FieldSpec::css("td:nth-child(4) > time")),
            ended: Some(FieldSpec::css(
                "td.baseList-space.title > div > div > img[alt=\"종료\"]",
            )),
            thumbnail: Some(FieldSpec::attr("td.baseList-space.title > a > img", "src")),
            ..ListingSelectors::default()
        },
        list_wait_selector: "#revolution_main_table".into(),
        detail: DetailSelectors {
            content: selectors(&["td.board-contents", ".board-contents"]),
            date: Some(FieldSpec::css(".sub-top-text-box").with_pattern(
                r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}(?::\d{2})?)",
            )),
            images: ImageRules::default().preferring(&["https://cdn2.ppomppu.co.kr/zboard/data3/"]),
        },
        detail_wait_selector: Some(".board-contents".into()),
        default_seller: "뽐뿌".into(),
        price_rules: PriceRules::VariesAware,
        strategy: SiteStrategy::Ppomppu,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extraction::ListingExtractor;
    use url::Url;

    const PAGE: &str = r#"
      <table id="revolution_main_table"><tbody>
        <tr class="baseNotice"><td class="baseList-space title"><div><div><a href="view.php?id=ppomppu&no=1">공지</a></div></div></td></tr>
        <tr class="baseList">
          <td>612345</td>
          <td class="baseList-space title">
            <a href="view.php?id=ppomppu&no=612345"><img src="//cdn2.ppomppu.co.kr/zboard/data3/small_612345.jpg"></a>
            <div>
              <div><a href="view.php?id=ppomppu&no=612345"><span>[쿠팡] 생수 2L 12개 (5,990원/무료)</span></a><span>12</span></div>
              <small>[식품/건강]</small>
            </div>
          </td>
          <td><div><nobr><a><span>뽐뿌회원</span></a></nobr></div></td>
          <td><time>25/08/19</time></td>
          <td class="baseList-space baseList-rec">5 - 0</td>
          <td class="baseList-space baseList-views">3,210</td>
        </tr>
      </tbody></table>"#;

    #[test]
    fn reads_a_live_shaped_row() {
        let extractor = ListingExtractor::compile(&config().listing).unwrap();
        let base = Url::parse(&config().base_url).unwrap();
        let items = extractor.extract(PAGE, &base);

        assert_eq!(items.len(), 1);
        let row = &items[0];
        assert_eq!(row.source_post_id, "612345");
        assert_eq!(row.title, "[쿠팡] 생수 2L 12개 (5,990원/무료)");
        assert_eq!(row.url, "https://www.ppomppu.co.kr/zboard/view.php?id=ppomppu&no=612345");
        assert_eq!(row.author.as_deref(), Some("뽐뿌회원"));
        assert_eq!(row.category_text.as_deref(), Some("[식품/건강]"));
        assert_eq!(row.comments_text.as_deref(), Some("12"));
        assert_eq!(row.date_text.as_deref(), Some("25/08/19"));
        assert_eq!(row.likes_text.as_deref(), Some("5 - 0"));
        assert_eq!(row.views_text.as_deref(), Some("3,210"));
        assert!(!row.is_ended);
        assert_eq!(
            row.thumbnail.as_deref(),
            Some("https://cdn2.ppomppu.co.kr/zboard/data3/small_612345.jpg")
        );
    }
}
