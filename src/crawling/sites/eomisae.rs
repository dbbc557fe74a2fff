//! 어미새 패션 특가
//!
//! Posts are cards; each counter is a `span.fr` told apart by its icon.

use crate::crawling::source_config::{PageUrlTemplate, SourceConfig};
use crate::crawling::strategy::SiteStrategy;
use crate::domain::deal::HotDealSource;
use crate::infrastructure::extraction::{DetailSelectors, FieldSpec, ImageRules, ListingSelectors};
use crate::infrastructure::normalize::PriceRules;

use super::selectors;

pub fn config() -> SourceConfig {
    SourceConfig {
        source: HotDealSource::Eomisae,
        base_url: "https://eomisae.co.kr/fs".into(),
        pages: PageUrlTemplate::new(
            "https://eomisae.co.kr/fs?page=1",
            "https://eomisae.co.kr/fs?page={page}",
        ),
        listing: ListingSelectors {
            rows: selectors(&["div.card_el.n_ntc"]),
            title: FieldSpec::css("h3 a.pjax"),
            link: FieldSpec::attr("h3 a.pjax", "href"),
            post_id: Some(FieldSpec::attr("h3 a.pjax", "href").with_pattern(r"/fs/(\d+)")),
            author: Some(FieldSpec::css("div.info span div")),
            category: Some(FieldSpec::css("span.cate")),
            views: Some(FieldSpec::css("span.fr").having("i.ion-ios-eye")),
            likes: Some(FieldSpec::css("span.fr").having("i.ion-ios-heart")),
            comments: Some(FieldSpec::css("span.fr").having("i.ion-ios-chatbubble")),
            date: Some(FieldSpec::css("p > span:not(.cate)")),
            thumbnail: Some(FieldSpec::attr("img.tmb", "src")),
            ..ListingSelectors::default()
        },
        list_wait_selector: "div.card_el".into(),
        detail: DetailSelectors {
            content: selectors(&[".xe_content", ".board-content", ".view-content"]),
            date: Some(FieldSpec::css(".top_area .date, .rd_hd .date")),
            images: ImageRules::default(),
        },
        detail_wait_selector: Some(".xe_content".into()),
        default_seller: "어미새".into(),
        price_rules: PriceRules::Standard,
        strategy: SiteStrategy::Eomisae,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extraction::ListingExtractor;
    use url::Url;

    #[test]
    fn counters_are_picked_by_icon() {
        let html = r#"<div class="card_wrap">
          <div class="card_el n_ntc">
            <a href="/fs/88231"><img class="tmb" src="/files/thumbnails/231/088/88231.jpg"></a>
            <h3><a class="pjax" href="/fs/88231">나이키 에어포스 1 89,000원</a></h3>
            <p><span class="cate">나이키,</span><span>3시간 전</span></p>
            <div class="info"><span><div>새집</div></span>
              <span class="fr"><i class="ion-ios-eye"></i> 1,532</span>
              <span class="fr"><i class="ion-ios-chatbubble"></i> 14</span>
              <span class="fr"><i class="ion-ios-heart"></i> 6</span>
            </div>
          </div></div>"#;
        let config = config();
        let items = ListingExtractor::compile(&config.listing)
            .unwrap()
            .extract(html, &Url::parse(&config.base_url).unwrap());

        assert_eq!(items.len(), 1);
        let row = &items[0];
        assert_eq!(row.source_post_id, "88231");
        assert_eq!(row.url, "https://eomisae.co.kr/fs/88231");
        assert_eq!(row.views_text.as_deref(), Some("1,532"));
        assert_eq!(row.comments_text.as_deref(), Some("14"));
        assert_eq!(row.likes_text.as_deref(), Some("6"));
        assert_eq!(row.date_text.as_deref(), Some("3시간 전"));
        assert_eq!(row.author.as_deref(), Some("새집"));
        assert_eq!(
            row.thumbnail.as_deref(),
            Some("https://eomisae.co.kr/files/thumbnails/231/088/88231.jpg")
        );
    }
}
