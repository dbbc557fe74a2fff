//! End-to-end crawl runs over canned board pages

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

use hotdeal_crawler::crawling::SourceCrawler;
use hotdeal_crawler::domain::{CrawlerOptions, HaltReason, HotDealRepository, HotDealSource};
use hotdeal_crawler::infrastructure::browser::{FixtureLauncher, FixturePage};
use hotdeal_crawler::infrastructure::InMemoryHotDealRepository;

const PAGE_1: &str = "https://bbs.ruliweb.com/market/board/1020?page=1";
const PAGE_2: &str = "https://bbs.ruliweb.com/market/board/1020?page=2";

fn row(id: u32, date: &str) -> String {
    format!(
        r#"<tr class="table_body">
             <td class="id">{id}</td>
             <td class="divsn"><a><strong>PC/하드웨어</strong></a></td>
             <td class="subject"><a class="subject_link" href="/market/board/1020/read/{id}">[11번가] 기계식 키보드 {id}호 39,000원</a><a class="num_reply">(3)</a></td>
             <td class="writer"><a>루리웹-{id}</a></td>
             <td class="recomd">2</td><td class="hit">1,234</td><td class="time">{date}</td>
           </tr>"#
    )
}

fn listing(rows: impl IntoIterator<Item = String>) -> String {
    let body: String = rows.into_iter().collect();
    format!(r#"<html><body><table class="board_list_table"><tbody>{body}</tbody></table></body></html>"#)
}

fn crawler(launcher: &FixtureLauncher, repository: Arc<dyn HotDealRepository>) -> SourceCrawler {
    SourceCrawler::for_source(HotDealSource::Ruliweb, Arc::new(launcher.clone()), repository)
        .unwrap()
        .with_backoff(Duration::ZERO, Duration::ZERO)
}

fn options(max_pages: u32) -> CrawlerOptions {
    CrawlerOptions {
        skip_detail: true,
        ..CrawlerOptions::default()
    }
    .without_delays()
    .with_max_pages(max_pages)
}

#[tokio::test]
async fn second_run_updates_every_post_instead_of_creating() {
    let launcher = FixtureLauncher::new()
        .with_html(PAGE_1, listing((1..=10).map(|id| row(id, "5분 전"))))
        .with_html(PAGE_2, listing((11..=20).map(|id| row(id, "3시간 전"))));
    let repository = Arc::new(InMemoryHotDealRepository::new());
    let crawler = crawler(&launcher, repository.clone());

    let first = crawler.crawl(&options(2)).await.unwrap();
    assert_eq!(first.total_crawled, 20);
    assert_eq!(first.new_deals + first.updated_deals, 20);
    assert_eq!(first.new_deals, 20);
    assert_eq!(first.errors, 0);
    assert_eq!(first.pages_crawled, 2);

    let second = crawler.crawl(&options(2)).await.unwrap();
    assert_eq!(second.new_deals, 0);
    assert_eq!(second.updated_deals, 20);
    assert_eq!(repository.len().await, 20);

    let stored = repository
        .find_by_source_and_post_id(HotDealSource::Ruliweb, "7")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.seller, "11번가");
    assert_eq!(stored.views, 1234);
    assert_eq!(stored.comment_count, 3);
    assert_eq!(stored.original_url, "https://bbs.ruliweb.com/market/board/1020/read/7");
}

#[tokio::test]
async fn listing_timeout_is_counted_not_raised() {
    let launcher = FixtureLauncher::new().with_page(PAGE_1, FixturePage::Timeout);
    let result = crawler(&launcher, Arc::new(InMemoryHotDealRepository::new()))
        .crawl(&options(2))
        .await
        .unwrap();

    assert_eq!(result.total_crawled, 0);
    assert!(result.errors >= 1);
    assert_eq!(result.halted_by, Some(HaltReason::NavigationFailed));
    // strict attempt, then the looser retry; page 2 is never requested
    assert_eq!(launcher.visits(), vec![PAGE_1.to_string(), PAGE_1.to_string()]);
    assert_eq!(launcher.sessions_closed(), 1);
}

#[tokio::test]
async fn failure_on_a_later_page_keeps_earlier_posts() {
    let launcher = FixtureLauncher::new()
        .with_html(PAGE_1, listing((1..=10).map(|id| row(id, "방금"))))
        .with_page(PAGE_2, FixturePage::Status(503));
    let result = crawler(&launcher, Arc::new(InMemoryHotDealRepository::new()))
        .crawl(&options(2))
        .await
        .unwrap();

    assert_eq!(result.total_crawled, 10);
    assert_eq!(result.errors, 1);
    assert_eq!(result.pages_crawled, 1);
}

#[tokio::test]
async fn time_window_stops_after_five_stale_posts() {
    let fresh = (1..=5).map(|id| row(id, &format!("{id}분 전")));
    let stale = (6..=10).map(|id| row(id, "2020.01.01"));
    let launcher = FixtureLauncher::new()
        .with_html(PAGE_1, listing(fresh.chain(stale)))
        .with_html(PAGE_2, listing((11..=20).map(|id| row(id, "2020.01.01"))));
    let repository = Arc::new(InMemoryHotDealRepository::new());

    let result = crawler(&launcher, repository.clone())
        .crawl(&options(5).with_time_filter(Some(24)))
        .await
        .unwrap();

    assert_eq!(result.total_crawled, 5);
    assert_eq!(result.new_deals, 5);
    assert_eq!(result.errors, 0);
    assert_eq!(result.halted_by, Some(HaltReason::StaleWindow));
    assert!(!launcher.visits().contains(&PAGE_2.to_string()));

    let kept: Vec<String> = repository
        .all()
        .await
        .into_iter()
        .map(|deal| deal.source_post_id)
        .collect();
    for id in 1..=5 {
        assert!(kept.contains(&id.to_string()), "post {id} was dropped");
    }
}

#[tokio::test]
async fn detail_page_enriches_the_post() {
    let detail_url = "https://bbs.ruliweb.com/market/board/1020/read/1";
    let launcher = FixtureLauncher::new()
        .with_html(PAGE_1, listing([row(1, "14:05")]))
        .with_html(
            detail_url,
            r#"<div class="user_info"><span class="regdate">2025.07.12 (16:56:24)</span></div>
               <div class="board_main_view"><div class="view_content">
                 오늘 하루만 이 가격입니다. 카드 할인 적용 시 더 저렴합니다.
                 <img src="https://i1.ruliweb.com/img/25/07/12/abc.jpg">
               </div></div>"#,
        );
    let repository = Arc::new(InMemoryHotDealRepository::new());
    let options = CrawlerOptions::default().without_delays().with_max_pages(1);

    let result = crawler(&launcher, repository.clone()).crawl(&options).await.unwrap();
    assert_eq!(result.total_crawled, 1);

    let deal = &result.hotdeals[0];
    assert_eq!(deal.created_at, Utc.with_ymd_and_hms(2025, 7, 12, 7, 56, 24).unwrap());
    assert_eq!(
        deal.image_url.as_deref(),
        Some("https://i1.ruliweb.com/img/25/07/12/abc.jpg")
    );
    assert!(deal.description.as_deref().unwrap().starts_with("오늘 하루만"));
}
