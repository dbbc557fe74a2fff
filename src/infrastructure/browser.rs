//! Browser session layer
//!
//! A crawl talks to exactly one page through [`PageDriver`]. The driver is
//! opened by a [`BrowserLauncher`] and owned by a single `crawl()` call, so
//! no page is ever shared between tasks.
//!
//! Three drivers exist:
//! - [`chromium::ChromiumLauncher`]: headless Chromium over CDP
//! - [`http::HttpLauncher`]: rate-limited plain fetches for server-rendered boards
//! - [`fixture::FixtureLauncher`]: canned HTML, for tests and offline replays

pub mod chromium;
pub mod fixture;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::options::CrawlerOptions;
use crate::infrastructure::config::{BrowserEngine, CrawlerSettings};
use crate::infrastructure::error::CrawlerResult;

pub use chromium::ChromiumLauncher;
pub use fixture::{FixtureLauncher, FixturePage};
pub use http::HttpLauncher;

/// When a navigation counts as finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitCondition {
    /// DOM parsed; scripts and images may still be loading
    DomContentLoaded,
    /// Full load event
    Load,
}

/// Hosts and resource types aborted before they reach the network
pub const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*googlesyndication.com*",
    "*doubleclick.net*",
    "*google-analytics.com*",
    "*googleadservices.com*",
    "*googletagmanager.com*",
    "*facebook.com/tr*",
    "*naver.com/adsystem*",
    "*.mp4*",
    "*.webm*",
    "*.mp3*",
    "*.woff*",
    "*.woff2*",
    "*.ttf*",
    "*.otf*",
    "*.eot*",
];

/// Chromium flags: container-friendly, automation fingerprint suppressed
pub const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-blink-features=AutomationControlled",
    "--disable-gpu",
    "--ignore-certificate-errors",
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
];

/// One open page
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate and wait for `wait`, giving up after `timeout`
    async fn goto(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> CrawlerResult<()>;

    /// `true` once `selector` matches something in the current document
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> bool;

    /// Serialized DOM of the current document
    async fn content(&mut self) -> CrawlerResult<String>;

    /// Release the page and its browser. Never fails; errors are logged.
    async fn close(&mut self);
}

/// Opens sessions for one crawl each
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn open(&self, options: &CrawlerOptions) -> CrawlerResult<Box<dyn PageDriver>>;

    fn name(&self) -> &'static str;
}

/// Launcher for the configured engine
pub fn launcher_for(settings: &CrawlerSettings) -> Arc<dyn BrowserLauncher> {
    match settings.engine {
        BrowserEngine::Chromium => {
            Arc::new(ChromiumLauncher::new(settings.chrome_executable.clone()))
        }
        BrowserEngine::Http => Arc::new(HttpLauncher::new(settings.http_requests_per_second)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_selects_launcher() {
        let mut settings = CrawlerSettings::default();
        assert_eq!(launcher_for(&settings).name(), "chromium");
        settings.engine = BrowserEngine::Http;
        assert_eq!(launcher_for(&settings).name(), "http");
    }
}
