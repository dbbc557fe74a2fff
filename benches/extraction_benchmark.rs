//! 목록 추출 + 정규화 벤치마크
//!
//! One ruliweb-shaped listing page of 50 rows, extracted and turned into
//! deals the way the crawl engine does it.

use chrono::Utc;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use url::Url;

use hotdeal_crawler::crawling::{build_deal, config_for};
use hotdeal_crawler::domain::{DetailEnrichment, HotDealSource};
use hotdeal_crawler::infrastructure::extraction::ListingExtractor;
use hotdeal_crawler::infrastructure::normalize::{parse_post_date, parse_price};

fn listing_page(rows: u32) -> String {
    let body: String = (1..=rows)
        .map(|id| {
            format!(
                r#"<tr class="table_body">
                     <td class="id">{id}</td>
                     <td class="divsn"><a><strong>PC/하드웨어</strong></a></td>
                     <td class="subject"><a class="subject_link" href="/market/board/1020/read/{id}">[G마켓] 27인치 모니터 {id} (189,000/무료)</a><a class="num_reply">({id})</a></td>
                     <td class="writer"><a>루리웹-{id}</a></td>
                     <td class="recomd">{id}</td><td class="hit">1,{id:03}</td><td class="time">25.07.11</td>
                   </tr>"#
            )
        })
        .collect();
    format!("<table><tbody>{body}</tbody></table>")
}

fn bench_listing(c: &mut Criterion) {
    let config = config_for(HotDealSource::Ruliweb);
    let extractor = ListingExtractor::compile(&config.listing).expect("selectors compile");
    let base = Url::parse(&config.base_url).expect("base url");
    let html = listing_page(50);
    let detail = DetailEnrichment::empty();

    c.bench_function("extract_listing_50_rows", |b| {
        b.iter(|| extractor.extract(black_box(&html), &base))
    });

    let items = extractor.extract(&html, &base);
    c.bench_function("build_deals_50_rows", |b| {
        b.iter(|| {
            let now = Utc::now();
            items
                .iter()
                .filter_map(|item| build_deal(&config, black_box(item), &detail, now))
                .count()
        })
    });
}

fn bench_normalizers(c: &mut Criterion) {
    let titles = [
        "[쿠팡] 무선 청소기 (27,600/무료)",
        "￦13,900 특가",
        "가격 다양 행사",
        "제목에 가격이 없음",
    ];
    c.bench_function("parse_price", |b| {
        b.iter(|| titles.iter().map(|t| parse_price(black_box(t))).count())
    });

    let dates = ["25/07/11", "07-11", "2025-07-12 16:56:24", "3시간 전", "14:05", "???"];
    c.bench_function("parse_post_date", |b| {
        b.iter(|| {
            let now = Utc::now();
            dates.iter().map(|d| parse_post_date(black_box(d), now)).count()
        })
    });
}

criterion_group!(benches, bench_listing, bench_normalizers);
criterion_main!(benches);
