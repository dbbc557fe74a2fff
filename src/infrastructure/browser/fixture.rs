//! Canned-page driver for tests and offline replays

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BrowserLauncher, PageDriver, WaitCondition};
use crate::domain::options::CrawlerOptions;
use crate::infrastructure::error::{CrawlerError, CrawlerResult};

/// What a fixture URL does when visited
#[derive(Debug, Clone)]
pub enum FixturePage {
    Html(String),
    /// Navigation never finishes
    Timeout,
    /// Server answers with this status
    Status(u16),
}

#[derive(Debug, Default)]
struct FixtureLog {
    visits: Mutex<Vec<String>>,
    launches: AtomicU32,
    opened: AtomicU32,
    closed: AtomicU32,
}

/// Serves pages from a URL → [`FixturePage`] table
#[derive(Debug, Clone, Default)]
pub struct FixtureLauncher {
    pages: Arc<HashMap<String, FixturePage>>,
    fail_launch: bool,
    log: Arc<FixtureLog>,
}

impl FixtureLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, page: FixturePage) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.into(), page);
        self
    }

    #[must_use]
    pub fn with_html(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_page(url, FixturePage::Html(html.into()))
    }

    /// Every `open` fails as if the browser binary were missing
    #[must_use]
    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// URLs navigated so far, across all sessions
    pub fn visits(&self) -> Vec<String> {
        self.log
            .visits
            .lock()
            .map(|visits| visits.clone())
            .unwrap_or_default()
    }

    /// `open` calls, including failed ones
    pub fn launch_attempts(&self) -> u32 {
        self.log.launches.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> u32 {
        self.log.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> u32 {
        self.log.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FixtureLauncher {
    async fn open(&self, _options: &CrawlerOptions) -> CrawlerResult<Box<dyn PageDriver>> {
        self.log.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(CrawlerError::browser_launch("fixture launch disabled"));
        }
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureDriver {
            pages: Arc::clone(&self.pages),
            log: Arc::clone(&self.log),
            document: None,
            closed: false,
        }))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

struct FixtureDriver {
    pages: Arc<HashMap<String, FixturePage>>,
    log: Arc<FixtureLog>,
    document: Option<String>,
    closed: bool,
}

#[async_trait]
impl PageDriver for FixtureDriver {
    async fn goto(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> CrawlerResult<()> {
        if let Ok(mut visits) = self.log.visits.lock() {
            visits.push(url.to_string());
        }
        self.document = None;
        match self.pages.get(url) {
            Some(FixturePage::Html(html)) => {
                self.document = Some(html.clone());
                Ok(())
            }
            Some(FixturePage::Timeout) => Err(CrawlerError::timeout(
                format!("navigate {url} ({wait:?})"),
                timeout.as_millis() as u64,
            )),
            Some(FixturePage::Status(status)) => Err(CrawlerError::HttpStatus {
                status: *status,
                url: url.to_string(),
            }),
            None => Err(CrawlerError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> bool {
        let (Some(document), Ok(parsed)) = (&self.document, Selector::parse(selector)) else {
            return false;
        };
        Html::parse_document(document).select(&parsed).next().is_some()
    }

    async fn content(&mut self) -> CrawlerResult<String> {
        self.document
            .clone()
            .ok_or_else(|| CrawlerError::page_content("no document loaded"))
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_html_and_simulates_failures() {
        let launcher = FixtureLauncher::new()
            .with_html("https://a/1", "<ul class='list'><li>x</li></ul>")
            .with_page("https://a/2", FixturePage::Timeout);
        let mut page = launcher.open(&CrawlerOptions::default()).await.unwrap();
        let wait = Duration::from_millis(10);

        page.goto("https://a/1", WaitCondition::DomContentLoaded, wait).await.unwrap();
        assert!(page.wait_for_selector("ul.list li", wait).await);
        assert!(!page.wait_for_selector("table", wait).await);

        let err = page.goto("https://a/2", WaitCondition::Load, wait).await.unwrap_err();
        assert!(matches!(err, CrawlerError::Timeout { .. }));
        assert!(page.content().await.is_err());

        page.close().await;
        page.close().await;
        assert_eq!(launcher.sessions_opened(), 1);
        assert_eq!(launcher.sessions_closed(), 1);
        assert_eq!(launcher.visits(), vec!["https://a/1", "https://a/2"]);
    }

    #[tokio::test]
    async fn failing_launch_reports_browser_error() {
        let launcher = FixtureLauncher::new().failing_launch();
        let err = launcher.open(&CrawlerOptions::default()).await.err().unwrap();
        assert!(matches!(err, CrawlerError::BrowserLaunch { .. }));
    }
}
