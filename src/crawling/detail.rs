//! Detail page enrichment
//!
//! Optional: every failure on the way degrades to an empty enrichment and
//! the post is still built from its listing row.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::domain::listing::DetailEnrichment;
use crate::infrastructure::browser::PageDriver;
use crate::infrastructure::config::defaults;
use crate::infrastructure::extraction::DetailExtractor;
use crate::infrastructure::retry::RetryPolicy;

pub struct DetailFetcher<'a> {
    extractor: &'a DetailExtractor,
    policy: RetryPolicy,
    wait_selector: Option<&'a str>,
    base: &'a Url,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(
        extractor: &'a DetailExtractor,
        policy: RetryPolicy,
        wait_selector: Option<&'a str>,
        base: &'a Url,
    ) -> Self {
        Self {
            extractor,
            policy,
            wait_selector,
            base,
        }
    }

    pub async fn fetch(
        &self,
        driver: &mut dyn PageDriver,
        url: &str,
        thumbnail: Option<&str>,
        now: DateTime<Utc>,
    ) -> DetailEnrichment {
        if let Err(e) = self.policy.navigate(driver, url).await {
            warn!("⚠️ Detail page unavailable, keeping listing data: {}", e);
            return DetailEnrichment::empty();
        }

        if let Some(selector) = self.wait_selector {
            let wait = Duration::from_millis(defaults::DETAIL_CONTENT_WAIT_MS);
            if !driver.wait_for_selector(selector, wait).await {
                debug!("Content block '{}' did not appear on {}", selector, url);
            }
        }

        let html = match driver.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("⚠️ Could not read detail page {}: {}", url, e);
                return DetailEnrichment::empty();
            }
        };

        let base = Url::parse(url).unwrap_or_else(|_| self.base.clone());
        self.extractor.extract(&html, &base, thumbnail, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::options::CrawlerOptions;
    use crate::infrastructure::browser::{BrowserLauncher, FixtureLauncher, FixturePage};
    use crate::infrastructure::extraction::DetailSelectors;

    #[tokio::test]
    async fn failed_navigation_degrades_to_empty() {
        let launcher = FixtureLauncher::new()
            .with_page("https://a.com/1", FixturePage::Timeout)
            .with_html(
                "https://a.com/2",
                r#"<div class="view_content">오늘만 이 가격입니다. 재고 소진 시 종료됩니다.<img src="/p/2.jpg"></div>"#,
            );
        let mut driver = launcher.open(&CrawlerOptions::default()).await.unwrap();
        let extractor = DetailExtractor::compile(&DetailSelectors::default()).unwrap();
        let base = Url::parse("https://a.com/").unwrap();
        let policy = RetryPolicy::detail(&CrawlerOptions::default());
        let fetcher = DetailFetcher::new(&extractor, policy, Some(".view_content"), &base);

        let missing = fetcher.fetch(driver.as_mut(), "https://a.com/1", None, Utc::now()).await;
        assert!(missing.is_empty());

        let found = fetcher.fetch(driver.as_mut(), "https://a.com/2", None, Utc::now()).await;
        assert!(found.content.unwrap().starts_with("오늘만"));
        assert_eq!(found.images, vec!["https://a.com/p/2.jpg"]);
    }
}
