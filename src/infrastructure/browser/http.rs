//! Plain HTTP page driver
//!
//! Most boards render their listings on the server, so a rate-limited
//! fetch yields the same document a browser would. `wait_for_selector`
//! inspects the static document instead of polling a live DOM.

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use scraper::{Html, Selector};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{BrowserLauncher, PageDriver, WaitCondition};
use crate::domain::options::CrawlerOptions;
use crate::infrastructure::config::defaults;
use crate::infrastructure::error::{CrawlerError, CrawlerResult};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct HttpLauncher {
    rate_limiter: Arc<DirectLimiter>,
}

impl HttpLauncher {
    /// `requests_per_second` of 0 is treated as 1
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        }
    }

    fn client(options: &CrawlerOptions) -> CrawlerResult<Client> {
        let mut headers = HeaderMap::new();
        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| CrawlerError::configuration("user_agent", e.to_string()))
        };
        headers.insert(USER_AGENT, header(&options.user_agent)?);
        headers.insert(ACCEPT, header(defaults::ACCEPT)?);
        headers.insert(ACCEPT_LANGUAGE, header(defaults::ACCEPT_LANGUAGE)?);

        Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_millis(defaults::SESSION_REQUEST_TIMEOUT_MS))
            .build()
            .map_err(|e| CrawlerError::browser_launch(format!("HTTP client: {e}")))
    }
}

#[async_trait]
impl BrowserLauncher for HttpLauncher {
    async fn open(&self, options: &CrawlerOptions) -> CrawlerResult<Box<dyn PageDriver>> {
        let client = Self::client(options)?;
        info!("✅ HTTP session ready");
        Ok(Box::new(HttpPage {
            client,
            rate_limiter: Arc::clone(&self.rate_limiter),
            document: None,
        }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

pub struct HttpPage {
    client: Client,
    rate_limiter: Arc<DirectLimiter>,
    document: Option<String>,
}

impl HttpPage {
    async fn fetch(&self, url: &str) -> CrawlerResult<String> {
        self.rate_limiter.until_ready().await;
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CrawlerError::navigation(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| CrawlerError::page_content(format!("{url}: {e}")))
    }
}

#[async_trait]
impl PageDriver for HttpPage {
    async fn goto(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> CrawlerResult<()> {
        // Static documents are complete once the body is read
        let _ = wait;
        self.document = None;
        let body = tokio::time::timeout(timeout, self.fetch(url))
            .await
            .map_err(|_| {
                CrawlerError::timeout(format!("fetch {url}"), timeout.as_millis() as u64)
            })??;
        debug!("Fetched {} ({} chars)", url, body.len());
        self.document = Some(body);
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> bool {
        let Some(document) = &self.document else {
            return false;
        };
        match Selector::parse(selector) {
            Ok(parsed) => Html::parse_document(document).select(&parsed).next().is_some(),
            Err(e) => {
                warn!("⚠️ Invalid selector '{}': {:?}", selector, e);
                false
            }
        }
    }

    async fn content(&mut self) -> CrawlerResult<String> {
        self.document
            .clone()
            .ok_or_else(|| CrawlerError::page_content("no document loaded"))
    }

    async fn close(&mut self) {
        self.document = None;
    }
}
