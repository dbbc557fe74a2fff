//! Headless Chromium driver (chromiumoxide)

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, Headers, SetBlockedUrLsParams, SetExtraHttpHeadersParams,
    SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventDomContentEventFired, EventLoadEventFired, NavigateParams,
};
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::{BLOCKED_URL_PATTERNS, BrowserLauncher, LAUNCH_ARGS, PageDriver, WaitCondition};
use crate::domain::options::CrawlerOptions;
use crate::infrastructure::config::defaults;
use crate::infrastructure::error::{CrawlerError, CrawlerResult};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn config(&self, options: &CrawlerOptions) -> CrawlerResult<BrowserConfig> {
        let viewport = options.viewport;
        let mut builder = BrowserConfig::builder()
            .viewport(CdpViewport {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .window_size(viewport.width, viewport.height)
            .request_timeout(Duration::from_millis(defaults::SESSION_REQUEST_TIMEOUT_MS))
            .args(LAUNCH_ARGS.iter().copied());

        if let Some(executable) = &self.executable {
            builder = builder.chrome_executable(executable);
        }
        if !options.headless {
            builder = builder.with_head();
        }

        builder.build().map_err(CrawlerError::browser_launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn open(&self, options: &CrawlerOptions) -> CrawlerResult<Box<dyn PageDriver>> {
        let (browser, mut handler) = Browser::launch(self.config(options)?)
            .await
            .map_err(|e| CrawlerError::browser_launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!("CDP handler event error: {}", e);
                }
            }
        });

        let mut driver = ChromiumPage {
            browser: Some(browser),
            page: None,
            handler_task: Some(handler_task),
            failure_task: None,
        };

        // A half-built session must still be torn down
        if let Err(e) = driver.prepare(options).await {
            driver.close().await;
            return Err(e);
        }

        info!("✅ Chromium session ready ({}x{})", options.viewport.width, options.viewport.height);
        Ok(Box::new(driver))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

pub struct ChromiumPage {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    failure_task: Option<JoinHandle<()>>,
}

fn cdp_error(context: &str, error: impl std::fmt::Display) -> CrawlerError {
    CrawlerError::browser_launch(format!("{context}: {error}"))
}

impl ChromiumPage {
    /// Open the page and pin locale, timezone, UA, headers and the blocklist
    async fn prepare(&mut self, options: &CrawlerOptions) -> CrawlerResult<()> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| CrawlerError::browser_launch("browser already closed"))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| cdp_error("new page", e))?;

        page.execute(EnableParams::default())
            .await
            .map_err(|e| cdp_error("network enable", e))?;

        let blocked: Vec<String> = BLOCKED_URL_PATTERNS.iter().map(|p| p.to_string()).collect();
        page.execute(SetBlockedUrLsParams::new(blocked))
            .await
            .map_err(|e| cdp_error("url blocklist", e))?;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(options.user_agent.clone())
            .accept_language(defaults::ACCEPT_LANGUAGE)
            .build()
            .map_err(|e| cdp_error("user agent", e))?;
        page.execute(user_agent)
            .await
            .map_err(|e| cdp_error("user agent", e))?;

        let headers = Headers::new(serde_json::json!({
            "Accept": defaults::ACCEPT,
            "Accept-Language": defaults::ACCEPT_LANGUAGE,
            "Accept-Encoding": "gzip, deflate, br",
            "Upgrade-Insecure-Requests": "1",
        }));
        page.execute(SetExtraHttpHeadersParams::new(headers))
            .await
            .map_err(|e| cdp_error("extra headers", e))?;

        page.execute(SetTimezoneOverrideParams::new(defaults::TIMEZONE))
            .await
            .map_err(|e| cdp_error("timezone", e))?;
        page.execute(SetLocaleOverrideParams {
            locale: Some(defaults::LOCALE.to_string()),
        })
        .await
        .map_err(|e| cdp_error("locale", e))?;

        let mut failures = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(|e| cdp_error("loading-failed listener", e))?;
        self.failure_task = Some(tokio::spawn(async move {
            while let Some(event) = failures.next().await {
                // Blocklist hits are expected noise
                if event.blocked_reason.is_none() {
                    debug!("Request failed: {}", event.error_text);
                }
            }
        }));

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> CrawlerResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| CrawlerError::page_content("page already closed"))
    }
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn goto(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> CrawlerResult<()> {
        let page = self.page()?;

        // Listen before navigating so the event cannot be missed
        let mut dom_ready = page
            .event_listener::<EventDomContentEventFired>()
            .await
            .map_err(|e| CrawlerError::navigation(url, e.to_string()))?;
        let mut loaded = page
            .event_listener::<EventLoadEventFired>()
            .await
            .map_err(|e| CrawlerError::navigation(url, e.to_string()))?;

        let navigation = async {
            let response = page
                .execute(NavigateParams::new(url))
                .await
                .map_err(|e| CrawlerError::navigation(url, e.to_string()))?;
            if let Some(error_text) = &response.result.error_text {
                return Err(CrawlerError::navigation(url, error_text.clone()));
            }
            let fired = match wait {
                WaitCondition::DomContentLoaded => dom_ready.next().await.is_some(),
                WaitCondition::Load => loaded.next().await.is_some(),
            };
            if fired {
                Ok(())
            } else {
                Err(CrawlerError::navigation(url, "page event stream closed"))
            }
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(CrawlerError::timeout(
                format!("navigate {url} ({wait:?})"),
                timeout.as_millis() as u64,
            )),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> bool {
        let Ok(page) = self.page() else {
            return false;
        };
        let poll = async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.is_ok()
    }

    async fn content(&mut self) -> CrawlerResult<String> {
        self.page()?
            .content()
            .await
            .map_err(|e| CrawlerError::page_content(e.to_string()))
    }

    async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("⚠️ Failed to close page: {}", e);
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("⚠️ Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Browser process wait failed: {}", e);
            }
        }
        for task in [self.failure_task.take(), self.handler_task.take()].into_iter().flatten() {
            task.abort();
        }
        debug!("Chromium session closed");
    }
}
