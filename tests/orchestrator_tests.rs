//! Multi-source runs, placeholders and export round trip

use std::sync::Arc;

use hotdeal_crawler::application::{CrawlOrchestrator, OrchestratorSettings};
use hotdeal_crawler::domain::{CrawlerOptions, HotDealSource};
use hotdeal_crawler::infrastructure::browser::FixtureLauncher;
use hotdeal_crawler::infrastructure::json_export::{import_deals, replay_into};
use hotdeal_crawler::infrastructure::InMemoryHotDealRepository;

fn eomisae_cards(ids: std::ops::RangeInclusive<u32>) -> String {
    let cards: String = ids
        .map(|id| {
            format!(
                r#"<div class="card_el n_ntc">
                     <h3><a class="pjax" href="/fs/{id}">[무신사] 러닝화 {id} 59,000원 무료배송</a></h3>
                     <p><span class="cate">패션,</span><span>{id}분 전</span></p>
                   </div>"#
            )
        })
        .collect();
    format!("<div id='list'>{cards}</div>")
}

fn options() -> CrawlerOptions {
    CrawlerOptions {
        skip_detail: true,
        ..CrawlerOptions::default()
    }
    .without_delays()
    .with_max_pages(1)
}

#[tokio::test]
async fn unreachable_board_does_not_stop_the_others() {
    // ppomppu has no fixture page: its listing answers 404
    let launcher =
        FixtureLauncher::new().with_html("https://eomisae.co.kr/fs?page=1", eomisae_cards(1..=3));
    let export_dir = tempfile::tempdir().unwrap();
    let settings = OrchestratorSettings::immediate()
        .with_export_dir(Some(export_dir.path().to_path_buf()));
    let orchestrator = CrawlOrchestrator::new(
        Arc::new(launcher.clone()),
        Arc::new(InMemoryHotDealRepository::new()),
        settings,
    );

    let report = orchestrator
        .run(&[HotDealSource::Ppomppu, HotDealSource::Eomisae], &options())
        .await;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].source, HotDealSource::Ppomppu);
    assert_eq!(report.results[0].total_crawled, 0);
    assert_eq!(report.results[0].errors, 1);
    assert_eq!(report.results[1].new_deals, 3);
    assert_eq!(report.total_crawled, 3);
    // a page failure is not a source failure
    assert!(report.failures.is_empty());
    assert_eq!(launcher.sessions_closed(), 2);

    assert_eq!(report.statistics.total_deals, 3);
    assert_eq!(report.statistics.category_counts.get("패션"), Some(&3));
    assert_eq!(report.statistics.free_shipping_count, 3);

    let path = report.export_path.expect("export written");
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("hotdeal-all-"));

    let batch = import_deals(&path).await.unwrap();
    assert_eq!(batch.hotdeals.len(), 3);
    let fresh_store = InMemoryHotDealRepository::new();
    let summary = replay_into(&fresh_store, &batch.hotdeals).await;
    assert_eq!(summary.created, 3);
    assert_eq!(fresh_store.len().await, 3);
}
